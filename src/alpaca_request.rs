use heapless::{String, Vec};

use crate::config::{
    EXTRA_PARAMETER_SLOTS, MAX_EXTRA_PARAMETER_NAME_LENGTH, MAX_EXTRA_PARAMETER_VALUE_LENGTH,
};
use crate::string_view::StringView;
use crate::tokens::{
    AlpacaApi, ApiGroup, DeviceMethod, DeviceType, HttpMethod, Parameter, SensorName,
};

/// Why an extra parameter was not stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InsertError {
    /// A parameter with the same name is already stored; the first value is kept.
    DuplicateParameter,
    /// The name doesn't fit in a slot.
    NameTooLong,
    /// The value doesn't fit in a slot.
    ValueTooLong,
    /// All slots are in use.
    TooManyParameters,
}

/// A parameter the decoder recognized but has no built-in handling for, or didn't recognize at
/// all. The value is kept exactly as sent, i.e. still url encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraParameter {
    parameter: Parameter,
    name: String<MAX_EXTRA_PARAMETER_NAME_LENGTH>,
    value: String<MAX_EXTRA_PARAMETER_VALUE_LENGTH>,
}

impl ExtraParameter {
    /// [`Parameter::Unknown`] for names not in the parameter table.
    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    /// Name as sent by the client.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Fixed capacity storage for [`ExtraParameter`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtraParameters {
    slots: Vec<ExtraParameter, EXTRA_PARAMETER_SLOTS>,
}

impl ExtraParameters {
    #[allow(missing_docs)]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Store a parameter. Names are compared case-insensitively to detect duplicates.
    pub fn insert(
        &mut self,
        parameter: Parameter,
        name: &StringView<'_>,
        value: &StringView<'_>,
    ) -> Result<(), InsertError> {
        if self.find_by_name(name.as_bytes()).is_some() {
            return Err(InsertError::DuplicateParameter);
        }

        let mut slot = ExtraParameter {
            parameter,
            name: String::new(),
            value: String::new(),
        };
        let name = core::str::from_utf8(name.as_bytes()).or(Err(InsertError::NameTooLong))?;
        slot.name.push_str(name).or(Err(InsertError::NameTooLong))?;
        let value = core::str::from_utf8(value.as_bytes()).or(Err(InsertError::ValueTooLong))?;
        slot.value.push_str(value).or(Err(InsertError::ValueTooLong))?;

        self.slots
            .push(slot)
            .or(Err(InsertError::TooManyParameters))
    }

    /// First stored parameter with the given id.
    pub fn find(&self, parameter: Parameter) -> Option<&ExtraParameter> {
        self.slots.iter().find(|slot| slot.parameter == parameter)
    }

    /// Stored parameter with the given name, ignoring case.
    pub fn find_by_name(&self, name: &[u8]) -> Option<&ExtraParameter> {
        self.slots
            .iter()
            .find(|slot| slot.name.as_bytes().eq_ignore_ascii_case(name))
    }

    #[allow(missing_docs)]
    pub fn iter(&self) -> impl Iterator<Item = &ExtraParameter> {
        self.slots.iter()
    }

    /// Number of stored parameters.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// No more parameters can be stored.
    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }

    #[allow(missing_docs)]
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// A decoded Alpaca request.
///
/// Every field starts out unknown (`Unknown` or `None`) and is filled in as the decoder works
/// through the request. Only [`AlpacaRequest::reset`] puts a field back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlpacaRequest {
    /// The HTTP method.
    pub http_method: HttpMethod,
    /// First segment of the path.
    pub api_group: ApiGroup,
    /// Which of the Alpaca APIs the path addresses.
    pub api: AlpacaApi,
    /// Device type from the path of device and setup requests.
    pub device_type: DeviceType,
    /// Device number from the path.
    pub device_number: Option<u32>,
    /// ASCOM method, the last path segment of a device request.
    pub device_method: DeviceMethod,

    /// `ClientID` parameter.
    pub client_id: Option<u32>,
    /// `ClientTransactionID` parameter, echoed back in the response.
    pub client_transaction_id: Option<u32>,
    /// `Connected` parameter.
    pub connected: Option<bool>,
    /// `Brightness` parameter.
    pub brightness: Option<i32>,
    /// `Id` parameter, the switch number.
    pub id: Option<u32>,
    /// `State` parameter.
    pub state: Option<bool>,
    /// `Value` parameter.
    pub value: Option<f64>,
    /// `AveragePeriod` parameter, in hours.
    pub average_period: Option<f64>,
    /// `SensorName` parameter.
    pub sensor_name: Option<SensorName>,

    /// The client sent `Connection: close`.
    pub do_close: bool,

    /// Parameters without built-in decoding.
    pub extra_parameters: ExtraParameters,
}

impl AlpacaRequest {
    #[allow(missing_docs)]
    pub const fn new() -> Self {
        Self {
            http_method: HttpMethod::Unknown,
            api_group: ApiGroup::Unknown,
            api: AlpacaApi::Unknown,
            device_type: DeviceType::Unknown,
            device_number: None,
            device_method: DeviceMethod::Unknown,
            client_id: None,
            client_transaction_id: None,
            connected: None,
            brightness: None,
            id: None,
            state: None,
            value: None,
            average_period: None,
            sensor_name: None,
            do_close: false,
            extra_parameters: ExtraParameters::new(),
        }
    }

    /// Return every field to its initial, unknown, state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
