//! SOAP request construction for `GetCursOnDate`.

use quick_xml::escape::escape;

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace of the `DailyInfo` web service.
pub const SERVICE_NS: &str = "http://web.cbr.ru/";

/// Remote operation name.
pub const OPERATION: &str = "GetCursOnDate";

/// Value of the `SOAPAction` header for [`OPERATION`].
pub const SOAP_ACTION: &str = "http://web.cbr.ru/GetCursOnDate";

/// Element carrying the date argument.
pub const DATE_ELEMENT: &str = "On_date";

/// A complete outbound SOAP document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapEnvelope(String);

impl SoapEnvelope {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Render the `GetCursOnDate` request for `date`.
///
/// The date is the only variable part and is escaped as character data.
pub fn build_envelope(date: &str) -> SoapEnvelope {
    SoapEnvelope(format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="{soap_ns}">"#,
            "<soap:Body>",
            r#"<{op} xmlns="{service_ns}">"#,
            "<{el}>{date}</{el}>",
            "</{op}>",
            "</soap:Body>",
            "</soap:Envelope>",
        ),
        soap_ns = SOAP_ENV_NS,
        service_ns = SERVICE_NS,
        op = OPERATION,
        el = DATE_ELEMENT,
        date = escape(date),
    ))
}
