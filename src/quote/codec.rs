//! SOAP envelopes for the legacy `GetLastTradePrice` operation.
//!
//! Request:
//! ```xml
//! <Envelope xmlns="http://schemas.xmlsoap.org/soap/envelope/">
//!   <Body>
//!     <GetLastTradePrice xmlns="urn:xtrac:quote"><Symbol>ABC</Symbol></GetLastTradePrice>
//!   </Body>
//! </Envelope>
//! ```
//!
//! Response: the same envelope around
//! `<GetLastTradePriceResponse><Price>123.45</Price></GetLastTradePriceResponse>`.
//!
//! Decoding accepts that one shape only. A SOAP fault or any other body node
//! is a [`DecodeError`], never a best-effort guess.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const QUOTE_NS: &str = "urn:xtrac:quote";
pub const SOAP_ACTION: &str = "\"GetLastTradePrice\"";
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

#[derive(Debug, Error)]
#[error("encode quote request: {0}")]
pub struct EncodeError(#[from] quick_xml::SeError);

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty response envelope")]
    Empty,

    #[error("response envelope is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed response envelope: unexpected root element `{0}`")]
    Root(String),

    #[error("malformed response envelope: {0}")]
    Xml(#[from] quick_xml::DeError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Envelope", deny_unknown_fields)]
struct Envelope<B> {
    #[serde(rename = "@xmlns", default)]
    xmlns: String,
    #[serde(rename = "Body")]
    body: B,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestBody {
    #[serde(rename = "GetLastTradePrice")]
    call: GetLastTradePrice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetLastTradePrice {
    #[serde(rename = "@xmlns", default)]
    xmlns: String,
    #[serde(rename = "Symbol")]
    symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseBody {
    #[serde(rename = "GetLastTradePriceResponse")]
    response: GetLastTradePriceResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetLastTradePriceResponse {
    #[serde(rename = "@xmlns", default)]
    xmlns: String,
    #[serde(rename = "Price")]
    price: String,
}

/// An encoded quote request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    symbol: String,
    xml: String,
}

impl OutboundRequest {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.xml.into_bytes()
    }
}

/// Build the request envelope for `symbol`. Deterministic.
pub fn encode(symbol: &str) -> Result<OutboundRequest, EncodeError> {
    let envelope = Envelope {
        xmlns: SOAP_ENVELOPE_NS.to_string(),
        body: RequestBody {
            call: GetLastTradePrice {
                xmlns: QUOTE_NS.to_string(),
                symbol: symbol.to_string(),
            },
        },
    };
    let xml = quick_xml::se::to_string(&envelope)?;
    Ok(OutboundRequest {
        symbol: symbol.to_string(),
        xml,
    })
}

/// Extract the price from a response envelope.
pub fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
    let text = non_empty(bytes)?;
    let envelope: Envelope<ResponseBody> = quick_xml::de::from_str(text)?;
    Ok(envelope.body.response.price)
}

/// Backend side: read the symbol out of a request envelope.
pub fn decode_request(bytes: &[u8]) -> Result<String, DecodeError> {
    let text = non_empty(bytes)?;
    let envelope: Envelope<RequestBody> = quick_xml::de::from_str(text)?;
    Ok(envelope.body.call.symbol)
}

/// Backend side: build a response envelope carrying `price`.
pub fn encode_response(price: &str) -> Result<String, EncodeError> {
    let envelope = Envelope {
        xmlns: SOAP_ENVELOPE_NS.to_string(),
        body: ResponseBody {
            response: GetLastTradePriceResponse {
                xmlns: QUOTE_NS.to_string(),
                price: price.to_string(),
            },
        },
    };
    Ok(quick_xml::se::to_string(&envelope)?)
}

/// UTF-8, non-blank, and rooted at `Envelope`.
///
/// The serde deserializer does not look at the root element's name, so it is
/// checked here before deserializing.
fn non_empty(bytes: &[u8]) -> Result<&str, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event().map_err(quick_xml::DeError::from)? {
            Event::Start(root) | Event::Empty(root) => {
                if root.local_name().as_ref() == b"Envelope" {
                    return Ok(text);
                }
                let name = String::from_utf8_lossy(root.name().as_ref()).into_owned();
                return Err(DecodeError::Root(name));
            }
            Event::Eof => return Err(DecodeError::Empty),
            _ => {}
        }
    }
}
