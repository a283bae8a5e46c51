//! Keywords of the Alpaca API and the HTTP subset it uses, with the tables that map them to
//! enums.
//!
//! All tables other than [`HTTP_METHODS`] hold lower case text and are matched
//! case-insensitively.

use crate::literal::Literal;
use crate::token::{Token, max, max_token_len};

/// HTTP request method. Matched case-sensitively.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpMethod {
    #[default]
    Unknown,
    GET,
    PUT,
    HEAD,
}

impl HttpMethod {
    /// GET and HEAD only read state from the server.
    pub fn is_read(self) -> bool {
        matches!(self, Self::GET | Self::HEAD)
    }

    /// Methods whose request may carry a form encoded body.
    pub fn has_body(self) -> bool {
        self == Self::PUT
    }
}

/// First segment of the path.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApiGroup {
    #[default]
    Unknown,
    /// `/api/...`
    Device,
    /// `/management/...`
    Management,
    /// `/setup...`
    Setup,
    /// `/`
    ServerStatus,
}

/// The API a request path addresses.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlpacaApi {
    #[default]
    Unknown,
    /// `/api/v1/{device_type}/{device_number}/{method}`
    DeviceApi,
    /// `/setup/v1/{device_type}/{device_number}/setup`
    DeviceSetup,
    /// `/management/apiversions`
    ManagementApiVersions,
    /// `/management/v1/description`
    ManagementDescription,
    /// `/management/v1/configureddevices`
    ManagementConfiguredDevices,
    /// `/setup`
    ServerSetup,
    /// `/`
    ServerStatus,
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManagementMethod {
    #[default]
    Unknown,
    Description,
    ConfiguredDevices,
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceType {
    #[default]
    Unknown,
    Camera,
    CoverCalibrator,
    Dome,
    FilterWheel,
    Focuser,
    ObservingConditions,
    Rotator,
    SafetyMonitor,
    Switch,
    Telescope,
}

/// Final segment of a device API or device setup path.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMethod {
    #[default]
    Unknown,

    /// The only method of [`AlpacaApi::DeviceSetup`].
    Setup,

    // Common to all device types.
    Action,
    CommandBlind,
    CommandBool,
    CommandString,
    Connected,
    Description,
    DriverInfo,
    DriverVersion,
    InterfaceVersion,
    Name,
    SupportedActions,

    // CoverCalibrator
    Brightness,
    CalibratorState,
    CoverState,
    MaxBrightness,
    CalibratorOff,
    CalibratorOn,
    CloseCover,
    HaltCover,
    OpenCover,

    // ObservingConditions
    AveragePeriod,
    CloudCover,
    DewPoint,
    Humidity,
    Pressure,
    RainRate,
    Refresh,
    SensorDescription,
    SkyBrightness,
    SkyQuality,
    SkyTemperature,
    StarFwhm,
    Temperature,
    TimeSinceLastUpdate,
    WindDirection,
    WindGust,
    WindSpeed,

    // SafetyMonitor
    IsSafe,

    // Switch
    MaxSwitch,
    CanWrite,
    GetSwitch,
    GetSwitchDescription,
    GetSwitchName,
    GetSwitchValue,
    MinSwitchValue,
    MaxSwitchValue,
    SetSwitch,
    SetSwitchName,
    SetSwitchValue,
    SwitchStep,
}

/// Request parameter, from the query string or a form encoded body.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parameter {
    #[default]
    Unknown,
    Action,
    ClientId,
    ClientTransactionId,
    Command,
    Connected,
    Parameters,
    Raw,
    Brightness,
    AveragePeriod,
    SensorName,
    Id,
    Name,
    State,
    Value,
}

/// Value of the `SensorName` parameter of ObservingConditions requests.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorName {
    #[default]
    Unknown,
    CloudCover,
    DewPoint,
    Humidity,
    Pressure,
    RainRate,
    SkyBrightness,
    SkyQuality,
    SkyTemperature,
    StarFwhm,
    Temperature,
    WindDirection,
    WindGust,
    WindSpeed,
}

/// Request header fields with built-in handling. Others are skipped.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpHeader {
    #[default]
    Unknown,
    Accept,
    Connection,
    ContentEncoding,
    ContentLength,
    ContentType,
}

/// Matched case-sensitively.
pub const HTTP_METHODS: &[Token<HttpMethod>] = &[
    Token::new("GET", HttpMethod::GET),
    Token::new("PUT", HttpMethod::PUT),
    Token::new("HEAD", HttpMethod::HEAD),
];

/// First path segments.
pub const API_GROUPS: &[Token<ApiGroup>] = &[
    Token::new("api", ApiGroup::Device),
    Token::new("management", ApiGroup::Management),
    Token::new("setup", ApiGroup::Setup),
];

/// Methods under `/management/v1/`.
pub const MANAGEMENT_METHODS: &[Token<ManagementMethod>] = &[
    Token::new("description", ManagementMethod::Description),
    Token::new("configureddevices", ManagementMethod::ConfiguredDevices),
];

/// Device types, as they appear in paths.
pub const DEVICE_TYPES: &[Token<DeviceType>] = &[
    Token::new("camera", DeviceType::Camera),
    Token::new("covercalibrator", DeviceType::CoverCalibrator),
    Token::new("dome", DeviceType::Dome),
    Token::new("filterwheel", DeviceType::FilterWheel),
    Token::new("focuser", DeviceType::Focuser),
    Token::new("observingconditions", DeviceType::ObservingConditions),
    Token::new("rotator", DeviceType::Rotator),
    Token::new("safetymonitor", DeviceType::SafetyMonitor),
    Token::new("switch", DeviceType::Switch),
    Token::new("telescope", DeviceType::Telescope),
];

/// The ASCOM methods of all device types.
pub const DEVICE_METHODS: &[Token<DeviceMethod>] = &[
    Token::new("setup", DeviceMethod::Setup),
    Token::new("action", DeviceMethod::Action),
    Token::new("commandblind", DeviceMethod::CommandBlind),
    Token::new("commandbool", DeviceMethod::CommandBool),
    Token::new("commandstring", DeviceMethod::CommandString),
    Token::new("connected", DeviceMethod::Connected),
    Token::new("description", DeviceMethod::Description),
    Token::new("driverinfo", DeviceMethod::DriverInfo),
    Token::new("driverversion", DeviceMethod::DriverVersion),
    Token::new("interfaceversion", DeviceMethod::InterfaceVersion),
    Token::new("name", DeviceMethod::Name),
    Token::new("supportedactions", DeviceMethod::SupportedActions),
    Token::new("brightness", DeviceMethod::Brightness),
    Token::new("calibratorstate", DeviceMethod::CalibratorState),
    Token::new("coverstate", DeviceMethod::CoverState),
    Token::new("maxbrightness", DeviceMethod::MaxBrightness),
    Token::new("calibratoroff", DeviceMethod::CalibratorOff),
    Token::new("calibratoron", DeviceMethod::CalibratorOn),
    Token::new("closecover", DeviceMethod::CloseCover),
    Token::new("haltcover", DeviceMethod::HaltCover),
    Token::new("opencover", DeviceMethod::OpenCover),
    Token::new("averageperiod", DeviceMethod::AveragePeriod),
    Token::new("cloudcover", DeviceMethod::CloudCover),
    Token::new("dewpoint", DeviceMethod::DewPoint),
    Token::new("humidity", DeviceMethod::Humidity),
    Token::new("pressure", DeviceMethod::Pressure),
    Token::new("rainrate", DeviceMethod::RainRate),
    Token::new("refresh", DeviceMethod::Refresh),
    Token::new("sensordescription", DeviceMethod::SensorDescription),
    Token::new("skybrightness", DeviceMethod::SkyBrightness),
    Token::new("skyquality", DeviceMethod::SkyQuality),
    Token::new("skytemperature", DeviceMethod::SkyTemperature),
    Token::new("starfwhm", DeviceMethod::StarFwhm),
    Token::new("temperature", DeviceMethod::Temperature),
    Token::new("timesincelastupdate", DeviceMethod::TimeSinceLastUpdate),
    Token::new("winddirection", DeviceMethod::WindDirection),
    Token::new("windgust", DeviceMethod::WindGust),
    Token::new("windspeed", DeviceMethod::WindSpeed),
    Token::new("issafe", DeviceMethod::IsSafe),
    Token::new("maxswitch", DeviceMethod::MaxSwitch),
    Token::new("canwrite", DeviceMethod::CanWrite),
    Token::new("getswitch", DeviceMethod::GetSwitch),
    Token::new("getswitchdescription", DeviceMethod::GetSwitchDescription),
    Token::new("getswitchname", DeviceMethod::GetSwitchName),
    Token::new("getswitchvalue", DeviceMethod::GetSwitchValue),
    Token::new("minswitchvalue", DeviceMethod::MinSwitchValue),
    Token::new("maxswitchvalue", DeviceMethod::MaxSwitchValue),
    Token::new("setswitch", DeviceMethod::SetSwitch),
    Token::new("setswitchname", DeviceMethod::SetSwitchName),
    Token::new("setswitchvalue", DeviceMethod::SetSwitchValue),
    Token::new("switchstep", DeviceMethod::SwitchStep),
];

/// Parameter names, matched regardless of case.
pub const PARAMETERS: &[Token<Parameter>] = &[
    Token::new("action", Parameter::Action),
    Token::new("clientid", Parameter::ClientId),
    Token::new("clienttransactionid", Parameter::ClientTransactionId),
    Token::new("command", Parameter::Command),
    Token::new("connected", Parameter::Connected),
    Token::new("parameters", Parameter::Parameters),
    Token::new("raw", Parameter::Raw),
    Token::new("brightness", Parameter::Brightness),
    Token::new("averageperiod", Parameter::AveragePeriod),
    Token::new("sensorname", Parameter::SensorName),
    Token::new("id", Parameter::Id),
    Token::new("name", Parameter::Name),
    Token::new("state", Parameter::State),
    Token::new("value", Parameter::Value),
];

/// Values of the `SensorName` parameter.
pub const SENSOR_NAMES: &[Token<SensorName>] = &[
    Token::new("cloudcover", SensorName::CloudCover),
    Token::new("dewpoint", SensorName::DewPoint),
    Token::new("humidity", SensorName::Humidity),
    Token::new("pressure", SensorName::Pressure),
    Token::new("rainrate", SensorName::RainRate),
    Token::new("skybrightness", SensorName::SkyBrightness),
    Token::new("skyquality", SensorName::SkyQuality),
    Token::new("skytemperature", SensorName::SkyTemperature),
    Token::new("starfwhm", SensorName::StarFwhm),
    Token::new("temperature", SensorName::Temperature),
    Token::new("winddirection", SensorName::WindDirection),
    Token::new("windgust", SensorName::WindGust),
    Token::new("windspeed", SensorName::WindSpeed),
];

/// Headers the decoder looks at. Others are skipped.
pub const HTTP_HEADERS: &[Token<HttpHeader>] = &[
    Token::new("accept", HttpHeader::Accept),
    Token::new("connection", HttpHeader::Connection),
    Token::new("content-encoding", HttpHeader::ContentEncoding),
    Token::new("content-length", HttpHeader::ContentLength),
    Token::new("content-type", HttpHeader::ContentType),
];

/// A receive buffer must be at least this large for every request to fit. The decoder has to see
/// a keyword together with the byte ending it, the whole of the form content type together with
/// the byte after it, and the HTTP version with its line ending.
pub const MIN_REQUIRED_BUFFER_SIZE: usize = max(
    max(
        max(max_token_len(DEVICE_TYPES), max_token_len(DEVICE_METHODS)),
        max(max_token_len(PARAMETERS), max_token_len(HTTP_HEADERS)),
    ) + 1,
    max(
        max_token_len(SENSOR_NAMES) + 1,
        max(FORM_URLENCODED.len() + 1, HTTP_VERSION_EOL.len()),
    ),
);

pub(crate) const V1: Literal = Literal::new("v1");
pub(crate) const API_VERSIONS: Literal = Literal::new("apiversions");
pub(crate) const HTTP_VERSION_EOL: Literal = Literal::new("HTTP/1.1\r\n");
pub(crate) const FORM_URLENCODED: Literal = Literal::new("application/x-www-form-urlencoded");
pub(crate) const CLOSE: Literal = Literal::new("close");
pub(crate) const IDENTITY: Literal = Literal::new("identity");
pub(crate) const TRUE: Literal = Literal::new("true");
pub(crate) const FALSE: Literal = Literal::new("false");
pub(crate) const ACCEPTABLE_MEDIA_TYPES: &[Literal] = &[
    Literal::new("application/json"),
    Literal::new("application/*"),
    Literal::new("*/*"),
];
