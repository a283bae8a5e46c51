use heapless::String;

use crate::alpaca_request::{AlpacaRequest, InsertError};
use crate::ascii::{
    COLON, CRLF, EQUALS, QUESTION, SLASH, SP, is_end_of_path, is_field_content, is_name_char,
    is_optional_whitespace, is_param_separator, is_param_value_char,
};
use crate::config::{DecoderConfig, MAX_EXTRA_PARAMETER_NAME_LENGTH};
use crate::literal::Literal;
use crate::response::StatusCode;
use crate::string_view::StringView;
use crate::token::{Token, match_case_insensitively, match_exactly, max_token_len};
use crate::tokens::{
    ACCEPTABLE_MEDIA_TYPES, API_GROUPS, API_VERSIONS, AlpacaApi, ApiGroup, CLOSE, DEVICE_METHODS,
    DEVICE_TYPES, DeviceMethod, FALSE, FORM_URLENCODED, HTTP_HEADERS, HTTP_METHODS,
    HTTP_VERSION_EOL, HttpHeader, IDENTITY, MANAGEMENT_METHODS, ManagementMethod, PARAMETERS,
    Parameter, SENSOR_NAMES, TRUE, V1,
};

/// Digits in the largest `u32`.
const MAX_DEVICE_NUMBER_DIGITS: usize = 10;

/// Progress reported by [`RequestDecoder::decode_buffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeStatus {
    /// Internal to the decoder: the current step finished and the next should run. Never
    /// returned by `decode_buffer`.
    ContinueDecoding,
    /// Call again with the unconsumed input followed by more bytes from the client.
    NeedMoreInput,
    /// Decoding has finished. [`StatusCode::OK`] means the request was decoded in full.
    Complete(StatusCode),
}

impl DecodeStatus {
    /// The status code, if decoding has finished.
    pub fn status_code(self) -> Option<StatusCode> {
        match self {
            Self::Complete(code) => Some(code),
            _ => None,
        }
    }
}

impl From<StatusCode> for DecodeStatus {
    fn from(value: StatusCode) -> Self {
        Self::Complete(value)
    }
}

/// Steps of the decoder, in the order they usually occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    HttpMethod,
    StartOfPath,
    ApiGroup,
    ManagementType,
    ManagementMethod,
    ApiVersion,
    DeviceType,
    DeviceNumber,
    DeviceMethod,
    EndOfPath,
    ParamName,
    ParamValue,
    ParamSeparator,
    HttpVersion,
    HeaderLines,
    HeaderName,
    HeaderValue,
    SkipHeaderValue,
    HeaderLineEnd,
}

/// Incremental decoder of Alpaca HTTP requests.
///
/// The caller owns the receive buffer. Each call to [`RequestDecoder::decode_buffer`] is handed
/// a view of the bytes not yet consumed; the decoder removes from the front of the view whatever
/// it has finished with. Once it needs more input the caller must keep the unconsumed bytes,
/// append newly received ones after them, and call again. The decoder never looks back at
/// bytes it has consumed, so nothing from the request is copied except the values of
/// [extra parameters](crate::alpaca_request::ExtraParameters).
///
/// ```
/// use alpacalite::config::DecoderConfig;
/// use alpacalite::request_decoder::{DecodeStatus, RequestDecoder};
/// use alpacalite::response::StatusCode;
/// use alpacalite::string_view::StringView;
/// use alpacalite::tokens::{DeviceMethod, DeviceType};
///
/// let mut decoder = RequestDecoder::new(DecoderConfig::new());
/// decoder.reset();
///
/// let mut input = StringView::from_str("GET /api/v1/safetymonitor/0/issafe?ClientID=7 HTTP/1.1\r\n\r\n");
/// assert_eq!(decoder.decode_buffer(&mut input, false), DecodeStatus::Complete(StatusCode::OK));
/// assert!(input.is_empty());
///
/// let request = decoder.request();
/// assert_eq!(request.device_type, DeviceType::SafetyMonitor);
/// assert_eq!(request.device_method, DeviceMethod::IsSafe);
/// assert_eq!(request.client_id, Some(7));
/// ```
#[derive(Debug)]
pub struct RequestDecoder {
    config: DecoderConfig,
    request: AlpacaRequest,
    phase: Option<Phase>,
    decoded: bool,
    is_decoding_header: bool,
    is_final_input: bool,
    found_content_length: bool,
    remaining_content_length: usize,
    current_header: HttpHeader,
    current_parameter: Parameter,
    parameter_name: Option<String<MAX_EXTRA_PARAMETER_NAME_LENGTH>>,
}

impl RequestDecoder {
    /// A decoder which must be [reset](RequestDecoder::reset) before use.
    pub const fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            request: AlpacaRequest::new(),
            phase: None,
            decoded: false,
            is_decoding_header: true,
            is_final_input: false,
            found_content_length: false,
            remaining_content_length: 0,
            current_header: HttpHeader::Unknown,
            current_parameter: Parameter::Unknown,
            parameter_name: None,
        }
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// The request decoded so far.
    pub fn request(&self) -> &AlpacaRequest {
        &self.request
    }

    #[allow(missing_docs)]
    pub fn request_mut(&mut self) -> &mut AlpacaRequest {
        &mut self.request
    }

    /// Prepare to decode a new request.
    pub fn reset(&mut self) {
        trace!("decoder reset");
        self.request.reset();
        self.phase = Some(Phase::HttpMethod);
        self.decoded = false;
        self.is_decoding_header = true;
        self.is_final_input = false;
        self.found_content_length = false;
        self.remaining_content_length = 0;
        self.current_header = HttpHeader::Unknown;
        self.current_parameter = Parameter::Unknown;
        self.parameter_name = None;
    }

    /// True between a reset and the end of decoding.
    pub fn is_decoding(&self) -> bool {
        self.phase.is_some()
    }

    /// True once the HTTP method has been decoded.
    pub fn has_started(&self) -> bool {
        self.phase != Some(Phase::HttpMethod)
    }

    /// Decode as much of `buffer` as possible, removing the consumed bytes from its front.
    ///
    /// `buffer_is_full` tells the decoder that the caller has no room to add more input. If the
    /// decoder then can't make progress the request has a line or token too large to handle,
    /// and the result is 431.
    ///
    /// Pipelining is not supported: if `buffer` holds bytes beyond the end of a body given by
    /// `Content-Length`, the result is 413. Only bytes in the same buffer are examined, so a
    /// caller which feeds the input in smaller pieces gets 200 once the body is complete, with
    /// the following bytes never passed in. Otherwise the result does not depend on how the
    /// input is split.
    ///
    /// Never returns [`DecodeStatus::ContinueDecoding`]. Must not be called again after a
    /// [`DecodeStatus::Complete`] without an intervening reset.
    pub fn decode_buffer(&mut self, buffer: &mut StringView<'_>, buffer_is_full: bool) -> DecodeStatus {
        debug_assert!(!self.decoded, "decode_buffer called after decoding completed");
        if self.phase.is_none() {
            return StatusCode::InternalServerError.into();
        }

        let start_size = buffer.len();
        let mut status = if self.is_decoding_header {
            self.decode_message_header(buffer)
        } else {
            self.decode_message_body(buffer)
        };
        debug_assert_ne!(status, DecodeStatus::ContinueDecoding);

        if buffer_is_full && status == DecodeStatus::NeedMoreInput && start_size == buffer.len() {
            debug!("need more input but the buffer is full");
            status = StatusCode::RequestHeaderFieldsTooLarge.into();
        }

        if let DecodeStatus::Complete(code) = status {
            debug!("decoding complete: {}", code);
            self.phase = None;
            self.decoded = true;
        }
        status
    }

    fn decode_message_header(&mut self, buffer: &mut StringView<'_>) -> DecodeStatus {
        let status = loop {
            let status = self.step(buffer);
            if status != DecodeStatus::ContinueDecoding {
                break status;
            }
        };

        if status == DecodeStatus::NeedMoreInput && !self.is_decoding_header {
            // The headers ended and a body follows.
            return self.decode_message_body(buffer);
        }
        status
    }

    fn decode_message_body(&mut self, buffer: &mut StringView<'_>) -> DecodeStatus {
        debug_assert!(self.found_content_length);

        if buffer.len() > self.remaining_content_length {
            // Pipelined requests are not supported.
            debug!(
                "more input than Content-Length: {} > {}",
                buffer.len(),
                self.remaining_content_length
            );
            return StatusCode::PayloadTooLarge.into();
        } else if buffer.len() == self.remaining_content_length {
            self.is_final_input = true;
        } else if self.is_final_input {
            return StatusCode::BadRequest.into();
        }

        loop {
            let size_before = buffer.len();
            let status = self.step(buffer);
            self.remaining_content_length -= size_before - buffer.len();
            if status != DecodeStatus::ContinueDecoding {
                return status;
            }
        }
    }

    fn step(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        let Some(phase) = self.phase else {
            return StatusCode::InternalServerError.into();
        };

        match phase {
            Phase::HttpMethod => self.decode_http_method(view),
            Phase::StartOfPath => self.match_start_of_path(view),
            Phase::ApiGroup => self.decode_api_group(view),
            Phase::ManagementType => self.decode_management_type(view),
            Phase::ManagementMethod => self.decode_management_method(view),
            Phase::ApiVersion => self.decode_api_version(view),
            Phase::DeviceType => self.decode_device_type(view),
            Phase::DeviceNumber => self.decode_device_number(view),
            Phase::DeviceMethod => self.decode_device_method(view),
            Phase::EndOfPath => self.decode_end_of_path(view),
            Phase::ParamName => self.decode_param_name(view),
            Phase::ParamValue => self.decode_param_value(view),
            Phase::ParamSeparator => self.decode_param_separator(view),
            Phase::HttpVersion => self.match_http_version(view),
            Phase::HeaderLines => self.decode_header_lines(view),
            Phase::HeaderName => self.decode_header_name(view),
            Phase::HeaderValue => self.decode_header_value(view),
            Phase::SkipHeaderValue => self.skip_header_value(view),
            Phase::HeaderLineEnd => self.decode_header_line_end(view),
        }
    }

    fn set_phase(&mut self, phase: Phase) -> DecodeStatus {
        trace!("phase {}", phase);
        debug_assert_ne!(self.phase, Some(phase));
        self.phase = Some(phase);
        DecodeStatus::ContinueDecoding
    }

    // Request line

    fn decode_http_method(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if keyword_too_long(view, HTTP_METHODS) {
            return StatusCode::NotImplemented.into();
        }
        let Some(name) = extract_name_before(view, SP) else {
            return DecodeStatus::NeedMoreInput;
        };
        let Ok(name) = name else {
            return StatusCode::BadRequest.into();
        };

        match match_exactly(HTTP_METHODS, &name) {
            Some(method) => {
                self.request.http_method = method;
                self.set_phase(Phase::StartOfPath)
            }
            None if name.is_empty() => StatusCode::BadRequest.into(),
            None => StatusCode::NotImplemented.into(),
        }
    }

    fn match_start_of_path(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if view.is_empty() {
            DecodeStatus::NeedMoreInput
        } else if view.match_and_consume(SLASH) {
            self.set_phase(Phase::ApiGroup)
        } else {
            StatusCode::BadRequest.into()
        }
    }

    fn decode_api_group(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if keyword_too_long(view, API_GROUPS) {
            return StatusCode::NotFound.into();
        }
        let Some(name) = extract_matching_prefix(view, is_name_char) else {
            return DecodeStatus::NeedMoreInput;
        };
        let method = self.request.http_method;

        let Some(group) = match_case_insensitively(API_GROUPS, &name) else {
            if name.is_empty() && is_end_of_path(view.front()) {
                // "/" is the server status page.
                self.request.api_group = ApiGroup::ServerStatus;
                self.request.api = AlpacaApi::ServerStatus;
                if !method.is_read() {
                    return StatusCode::MethodNotAllowed.into();
                }
                return self.set_phase(Phase::EndOfPath);
            } else if name.is_empty() {
                return StatusCode::BadRequest.into();
            }
            return StatusCode::NotFound.into();
        };
        self.request.api_group = group;

        if view.match_and_consume(SLASH) {
            if !method.is_read() && group != ApiGroup::Device {
                return StatusCode::MethodNotAllowed.into();
            }
            return match group {
                ApiGroup::Device => {
                    self.request.api = AlpacaApi::DeviceApi;
                    self.set_phase(Phase::ApiVersion)
                }
                ApiGroup::Setup => {
                    self.request.api = AlpacaApi::DeviceSetup;
                    self.set_phase(Phase::ApiVersion)
                }
                ApiGroup::Management => self.set_phase(Phase::ManagementType),
                ApiGroup::Unknown | ApiGroup::ServerStatus => {
                    StatusCode::InternalServerError.into()
                }
            };
        }

        if group != ApiGroup::Setup {
            return StatusCode::BadRequest.into();
        }
        self.request.api = AlpacaApi::ServerSetup;
        if !method.is_read() {
            return StatusCode::MethodNotAllowed.into();
        }
        self.set_phase(Phase::EndOfPath)
    }

    fn decode_management_type(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if name_run(view) > API_VERSIONS.len() {
            return StatusCode::NotFound.into();
        }
        let Some(name) = extract_matching_prefix(view, is_name_char) else {
            return DecodeStatus::NeedMoreInput;
        };

        if V1.eq_view(&name) {
            if view.match_and_consume(SLASH) {
                self.set_phase(Phase::ManagementMethod)
            } else {
                StatusCode::BadRequest.into()
            }
        } else if API_VERSIONS.lowered_eq(&name) {
            self.request.api = AlpacaApi::ManagementApiVersions;
            self.set_phase(Phase::EndOfPath)
        } else if name.is_empty() {
            StatusCode::BadRequest.into()
        } else {
            StatusCode::NotFound.into()
        }
    }

    fn decode_management_method(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if keyword_too_long(view, MANAGEMENT_METHODS) {
            return StatusCode::NotFound.into();
        }
        let Some(name) = extract_matching_prefix(view, is_name_char) else {
            return DecodeStatus::NeedMoreInput;
        };

        match match_case_insensitively(MANAGEMENT_METHODS, &name) {
            Some(ManagementMethod::Description) => {
                self.request.api = AlpacaApi::ManagementDescription;
                self.set_phase(Phase::EndOfPath)
            }
            Some(ManagementMethod::ConfiguredDevices) => {
                self.request.api = AlpacaApi::ManagementConfiguredDevices;
                self.set_phase(Phase::EndOfPath)
            }
            Some(ManagementMethod::Unknown) => StatusCode::InternalServerError.into(),
            None if name.is_empty() => StatusCode::BadRequest.into(),
            None => StatusCode::NotFound.into(),
        }
    }

    fn decode_api_version(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if name_run(view) > V1.len() {
            return StatusCode::BadRequest.into();
        }
        let Some(name) = extract_name_before(view, SLASH) else {
            return DecodeStatus::NeedMoreInput;
        };

        match name {
            Ok(name) if V1.eq_view(&name) => self.set_phase(Phase::DeviceType),
            _ => StatusCode::BadRequest.into(),
        }
    }

    fn decode_device_type(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if keyword_too_long(view, DEVICE_TYPES) {
            return StatusCode::NotFound.into();
        }
        let Some(name) = extract_name_before(view, SLASH) else {
            return DecodeStatus::NeedMoreInput;
        };
        let Ok(name) = name else {
            return StatusCode::BadRequest.into();
        };

        match match_case_insensitively(DEVICE_TYPES, &name) {
            Some(device_type) => {
                self.request.device_type = device_type;
                self.set_phase(Phase::DeviceNumber)
            }
            None if name.is_empty() => StatusCode::BadRequest.into(),
            None => StatusCode::NotFound.into(),
        }
    }

    fn decode_device_number(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if name_run(view) > MAX_DEVICE_NUMBER_DIGITS {
            return StatusCode::BadRequest.into();
        }
        let Some(name) = extract_name_before(view, SLASH) else {
            return DecodeStatus::NeedMoreInput;
        };

        match name.ok().and_then(|name| name.to_u32()) {
            Some(number) => {
                self.request.device_number = Some(number);
                self.set_phase(Phase::DeviceMethod)
            }
            None => StatusCode::BadRequest.into(),
        }
    }

    fn decode_device_method(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if keyword_too_long(view, DEVICE_METHODS) {
            return StatusCode::NotFound.into();
        }
        let Some(name) = extract_matching_prefix(view, is_name_char) else {
            return DecodeStatus::NeedMoreInput;
        };
        if !is_end_of_path(view.front()) {
            // More path segments, or an unexpected delimiter.
            return StatusCode::BadRequest.into();
        }

        let Some(method) = match_case_insensitively(DEVICE_METHODS, &name) else {
            return if name.is_empty() {
                StatusCode::BadRequest.into()
            } else {
                StatusCode::NotFound.into()
            };
        };
        let is_setup_api = self.request.api == AlpacaApi::DeviceSetup;
        if is_setup_api != (method == DeviceMethod::Setup) {
            return StatusCode::NotFound.into();
        }
        self.request.device_method = method;
        self.set_phase(Phase::EndOfPath)
    }

    fn decode_end_of_path(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if view.match_and_consume(QUESTION) {
            self.set_phase(Phase::ParamName)
        } else if view.match_and_consume(SP) {
            self.set_phase(Phase::HttpVersion)
        } else if view.is_empty() {
            DecodeStatus::NeedMoreInput
        } else {
            StatusCode::BadRequest.into()
        }
    }

    fn match_http_version(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if view.skip_prefix(HTTP_VERSION_EOL.as_bytes()) {
            self.set_phase(Phase::HeaderLines)
        } else if HTTP_VERSION_EOL.starts_with(view) {
            DecodeStatus::NeedMoreInput
        } else {
            StatusCode::HttpVersionNotSupported.into()
        }
    }

    // Parameters, from the query string or the body

    fn decode_param_name(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        let Some(name) = extract_name_before(view, EQUALS) else {
            if !self.is_decoding_header && self.is_final_input {
                // The body ends with a parameter name and no value.
                return StatusCode::BadRequest.into();
            }
            return DecodeStatus::NeedMoreInput;
        };
        let Ok(name) = name else {
            return StatusCode::BadRequest.into();
        };
        if name.is_empty() {
            return StatusCode::BadRequest.into();
        }

        self.current_parameter =
            match_case_insensitively(PARAMETERS, &name).unwrap_or(Parameter::Unknown);
        self.parameter_name = None;

        if self.config.allow_extra_parameters
            && !has_built_in_decoding(self.current_parameter)
            && !self.request.extra_parameters.is_full()
        {
            let mut kept = String::new();
            let fits = core::str::from_utf8(name.as_bytes())
                .ok()
                .is_some_and(|name| kept.push_str(name).is_ok());
            if !fits {
                return StatusCode::RequestHeaderFieldsTooLarge.into();
            }
            self.parameter_name = Some(kept);
        }
        self.set_phase(Phase::ParamValue)
    }

    fn decode_param_value(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        let value = match extract_matching_prefix(view, is_param_value_char) {
            Some(value) => value,
            None if !self.is_decoding_header && self.is_final_input => {
                // The end of the body terminates the value.
                debug_assert_eq!(self.remaining_content_length, view.len());
                let value = *view;
                view.remove_prefix(value.len());
                value
            }
            None => return DecodeStatus::NeedMoreInput,
        };

        let request = &mut self.request;
        let valid = match self.current_parameter {
            Parameter::ClientId => set_once(&mut request.client_id, value.to_u32()),
            Parameter::ClientTransactionId => {
                set_once(&mut request.client_transaction_id, value.to_u32())
            }
            Parameter::Id => set_once(&mut request.id, value.to_u32()),
            Parameter::Brightness => set_once(&mut request.brightness, value.to_i32()),
            Parameter::Value => set_once(&mut request.value, value.to_f64()),
            Parameter::AveragePeriod => set_once(&mut request.average_period, value.to_f64()),
            Parameter::Connected => set_once(&mut request.connected, decode_true_false(&value)),
            Parameter::State => set_once(&mut request.state, decode_true_false(&value)),
            Parameter::SensorName => set_once(
                &mut request.sensor_name,
                match_case_insensitively(SENSOR_NAMES, &value),
            ),
            _ => true,
        };
        if !valid {
            debug!("invalid or repeated value {} for {}", value, self.current_parameter);
            return StatusCode::BadRequest.into();
        }

        if self.config.allow_extra_parameters && !has_built_in_decoding(self.current_parameter) {
            let status = self.store_extra_parameter(&value);
            if status != DecodeStatus::ContinueDecoding {
                return status;
            }
        }
        self.set_phase(Phase::ParamSeparator)
    }

    fn store_extra_parameter(&mut self, value: &StringView<'_>) -> DecodeStatus {
        let Some(name) = self.parameter_name.take() else {
            warn!("no slot for extra parameter {}, dropped", self.current_parameter);
            return DecodeStatus::ContinueDecoding;
        };

        let name = StringView::from_str(&name);
        match self
            .request
            .extra_parameters
            .insert(self.current_parameter, &name, value)
        {
            Ok(()) => DecodeStatus::ContinueDecoding,
            Err(InsertError::DuplicateParameter) => {
                debug!("duplicate extra parameter {}", name);
                DecodeStatus::ContinueDecoding
            }
            Err(InsertError::TooManyParameters) => {
                warn!("no slot for extra parameter {}, dropped", name);
                DecodeStatus::ContinueDecoding
            }
            Err(InsertError::NameTooLong | InsertError::ValueTooLong) => {
                StatusCode::RequestHeaderFieldsTooLarge.into()
            }
        }
    }

    fn decode_param_separator(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        self.current_parameter = Parameter::Unknown;

        let Some(beyond) = view.find_first_not_of(is_param_separator) else {
            if !self.is_decoding_header && self.is_final_input {
                view.remove_prefix(view.len());
                return StatusCode::OK.into();
            }
            // Collapse runs of separators, keeping one until we see what follows.
            if view.len() > 1 {
                view.remove_prefix(view.len() - 1);
            }
            return DecodeStatus::NeedMoreInput;
        };

        view.remove_prefix(beyond);
        if view.front() == SP {
            if self.is_decoding_header {
                view.remove_prefix(1);
                return self.set_phase(Phase::HttpVersion);
            }
            return StatusCode::BadRequest.into();
        }
        self.set_phase(Phase::ParamName)
    }

    // Header lines

    fn decode_header_lines(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if view.skip_prefix(CRLF) {
            return self.end_of_headers();
        } else if view.is_prefix_of(CRLF) {
            // Empty, or the start of the blank line.
            return DecodeStatus::NeedMoreInput;
        }
        self.set_phase(Phase::HeaderName)
    }

    fn end_of_headers(&mut self) -> DecodeStatus {
        let method = self.request.http_method;
        if method.is_read() {
            // Any body of a GET or HEAD is not examined.
            StatusCode::OK.into()
        } else if !method.has_body() {
            StatusCode::InternalServerError.into()
        } else if !self.found_content_length {
            StatusCode::LengthRequired.into()
        } else if self.remaining_content_length == 0 {
            // All the parameters, if any, were in the query string.
            StatusCode::OK.into()
        } else {
            self.is_decoding_header = false;
            self.set_phase(Phase::ParamName);
            DecodeStatus::NeedMoreInput
        }
    }

    fn decode_header_name(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        let Some(name) = extract_name_before(view, COLON) else {
            return DecodeStatus::NeedMoreInput;
        };
        let Ok(name) = name else {
            return StatusCode::BadRequest.into();
        };
        if name.is_empty() {
            return StatusCode::BadRequest.into();
        }

        self.current_header = match_case_insensitively(HTTP_HEADERS, &name).unwrap_or(HttpHeader::Unknown);
        match self.current_header {
            HttpHeader::Unknown => self.set_phase(Phase::SkipHeaderValue),
            HttpHeader::Accept if self.request.api != AlpacaApi::DeviceApi => {
                self.set_phase(Phase::SkipHeaderValue)
            }
            _ => self.set_phase(Phase::HeaderValue),
        }
    }

    fn decode_header_value(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        match view.find_first_not_of(is_optional_whitespace) {
            Some(beyond) => view.remove_prefix(beyond),
            None => {
                view.remove_prefix(view.len());
                return DecodeStatus::NeedMoreInput;
            }
        }
        let Some(mut value) = extract_matching_prefix(view, is_field_content) else {
            return DecodeStatus::NeedMoreInput;
        };
        trim_trailing_whitespace(&mut value);

        let status = match self.current_header {
            HttpHeader::ContentLength => self.process_content_length(&value),
            HttpHeader::ContentType => {
                let mut media_type = match value.find(b";") {
                    Some(end) => value.prefix(end),
                    None => value,
                };
                trim_trailing_whitespace(&mut media_type);
                if !FORM_URLENCODED.case_eq(&media_type) {
                    StatusCode::UnsupportedMediaType.into()
                } else if !self.request.http_method.has_body() {
                    StatusCode::BadRequest.into()
                } else {
                    DecodeStatus::ContinueDecoding
                }
            }
            HttpHeader::ContentEncoding if !IDENTITY.case_eq(&value) => {
                StatusCode::UnsupportedMediaType.into()
            }
            HttpHeader::Connection => {
                if CLOSE.case_eq(&value) {
                    self.request.do_close = true;
                }
                DecodeStatus::ContinueDecoding
            }
            HttpHeader::Accept if !is_acceptable(&value) => StatusCode::NotAcceptable.into(),
            _ => DecodeStatus::ContinueDecoding,
        };
        if status != DecodeStatus::ContinueDecoding {
            debug!("invalid {} header value {}", self.current_header, value);
            return status;
        }
        self.set_phase(Phase::HeaderLineEnd)
    }

    fn process_content_length(&mut self, value: &StringView<'_>) -> DecodeStatus {
        if self.found_content_length {
            return StatusCode::BadRequest.into();
        }
        let Some(length) = value.to_u32() else {
            return StatusCode::BadRequest.into();
        };
        let length = length as usize;
        if length > 0 && !self.request.http_method.has_body() {
            // A body on a GET would be ignored; reject it rather than guess at its meaning.
            StatusCode::BadRequest.into()
        } else if length > self.config.max_payload_size {
            StatusCode::PayloadTooLarge.into()
        } else {
            self.remaining_content_length = length;
            self.found_content_length = true;
            DecodeStatus::ContinueDecoding
        }
    }

    fn skip_header_value(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        match view.find(b"\r") {
            Some(end) => {
                view.remove_prefix(end);
                self.set_phase(Phase::HeaderLineEnd)
            }
            None => {
                view.remove_prefix(view.len());
                DecodeStatus::NeedMoreInput
            }
        }
    }

    fn decode_header_line_end(&mut self, view: &mut StringView<'_>) -> DecodeStatus {
        if view.skip_prefix(CRLF) {
            self.set_phase(Phase::HeaderLines)
        } else if view.is_prefix_of(CRLF) {
            DecodeStatus::NeedMoreInput
        } else {
            StatusCode::BadRequest.into()
        }
    }
}

/// Split off the leading run of characters matching `test`. `None` if every character in the
/// view matches, in which case the run may continue in input not yet received.
fn extract_matching_prefix<'a>(
    view: &mut StringView<'a>,
    test: impl Fn(u8) -> bool,
) -> Option<StringView<'a>> {
    let beyond = view.find_first_not_of(test)?;
    let prefix = view.prefix(beyond);
    view.remove_prefix(beyond);
    Some(prefix)
}

/// Split off a name which must be followed by `terminator`, and consume the terminator.
/// `Some(Err(()))` if the name is followed by something else.
fn extract_name_before<'a>(
    view: &mut StringView<'a>,
    terminator: u8,
) -> Option<Result<StringView<'a>, ()>> {
    let name = extract_matching_prefix(view, is_name_char)?;
    if view.match_and_consume(terminator) {
        Some(Ok(name))
    } else {
        Some(Err(()))
    }
}

/// Length of the run of name characters at the front of the view.
fn name_run(view: &StringView<'_>) -> usize {
    view.find_first_not_of(is_name_char).unwrap_or(view.len())
}

/// True once the name at the front of the view is longer than any token in `tokens`, whether
/// or not its end has arrived yet.
fn keyword_too_long<E>(view: &StringView<'_>, tokens: &[Token<E>]) -> bool {
    name_run(view) > max_token_len(tokens)
}

fn trim_trailing_whitespace(view: &mut StringView<'_>) {
    while !view.is_empty() && is_optional_whitespace(view.back()) {
        view.remove_suffix(1);
    }
}

/// Store `value` in a field which has not been set yet. False if the value is invalid or the
/// field already has one.
fn set_once<T>(field: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(value) if field.is_none() => {
            *field = Some(value);
            true
        }
        _ => false,
    }
}

fn decode_true_false(value: &StringView<'_>) -> Option<bool> {
    if TRUE.lowered_eq(value) {
        Some(true)
    } else if FALSE.lowered_eq(value) {
        Some(false)
    } else {
        None
    }
}

fn is_acceptable(value: &StringView<'_>) -> bool {
    ACCEPTABLE_MEDIA_TYPES
        .iter()
        .any(|media_type: &Literal| media_type.is_case_insensitive_substring_of(value))
}

/// Parameters decoded into dedicated fields of [`AlpacaRequest`].
fn has_built_in_decoding(parameter: Parameter) -> bool {
    matches!(
        parameter,
        Parameter::ClientId
            | Parameter::ClientTransactionId
            | Parameter::Id
            | Parameter::Brightness
            | Parameter::Value
            | Parameter::AveragePeriod
            | Parameter::Connected
            | Parameter::State
            | Parameter::SensorName
    )
}
