/// Parser for `data:` URLs carried in captured face bindings
use std::fmt;

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::rest,
    multi::many0,
    sequence::preceded,
    IResult,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL: {0}")]
    Malformed(String),

    #[error("data URL has an empty payload")]
    EmptyPayload,
}

/// A decoded `data:<mime>[;params][;base64],<payload>` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    /// Parameters other than `base64`, such as `charset=utf-8`, in order
    pub params: Vec<String>,
    pub base64: bool,
    pub payload: String,
}

impl DataUrl {
    pub fn base64(mime: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            params: Vec::new(),
            base64: true,
            payload: payload.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{}", self.mime)?;
        for param in &self.params {
            write!(f, ";{param}")?;
        }
        if self.base64 {
            f.write_str(";base64")?;
        }
        write!(f, ",{}", self.payload)
    }
}

impl std::str::FromStr for DataUrl {
    type Err = DataUrlError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_data_url(input)
    }
}

/// Parse a data URL, rejecting empty payloads
pub fn parse_data_url(input: &str) -> Result<DataUrl, DataUrlError> {
    let (_, url) = data_url(input.trim()).map_err(|_| DataUrlError::Malformed(preview(input)))?;
    if url.payload.is_empty() {
        return Err(DataUrlError::EmptyPayload);
    }
    Ok(url)
}

fn data_url(input: &str) -> IResult<&str, DataUrl> {
    let (input, _) = tag("data:")(input)?;
    let (input, mime) = take_while(|c: char| c != ';' && c != ',')(input)?;
    let (input, params) = many0(preceded(
        char(';'),
        take_while1(|c: char| c != ';' && c != ','),
    ))(input)?;
    let (input, _) = char(',')(input)?;
    let (input, payload) = rest(input)?;

    let mime = if mime.is_empty() { "text/plain" } else { mime };
    Ok((
        input,
        DataUrl {
            mime: mime.to_ascii_lowercase(),
            params: params
                .iter()
                .filter(|param| !param.eq_ignore_ascii_case("base64"))
                .map(|param| param.to_string())
                .collect(),
            base64: params.iter().any(|param| param.eq_ignore_ascii_case("base64")),
            payload: payload.to_string(),
        },
    ))
}

fn preview(input: &str) -> String {
    input.chars().take(32).collect()
}
