use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The category a run of bytes is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum What {
    /// The fixed part of the function descriptor.
    FixedHeader,
    /// The array of funcdata pointers.
    FuncData,
    /// The stack pointer delta table.
    PcSp,
    /// The file number table.
    PcFile,
    /// The line number table.
    PcLn,
    /// A numbered pcdata table, including its descriptor offset slot.
    PcData(u32),
    /// The machine code of the function.
    Text,
    /// The function name string including its NUL terminator.
    FuncName,
    /// Bytes of the binary not attributed to any function.
    Todo,
}

/// Conventional role of the first few pcdata indices.
fn pcdata_suffix(index: u32) -> &'static str {
    match index {
        0 => "-regmap",
        1 => "-stackmap",
        2 => "-inltree",
        _ => "",
    }
}

impl fmt::Display for What {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            What::FixedHeader => write!(f, "fixedheader"),
            What::FuncData => write!(f, "funcdata"),
            What::PcSp => write!(f, "pcsp"),
            What::PcFile => write!(f, "pcfile"),
            What::PcLn => write!(f, "pcln"),
            What::PcData(index) => write!(f, "pcdata{}{}", index, pcdata_suffix(index)),
            What::Text => write!(f, "text"),
            What::FuncName => write!(f, "funcname"),
            What::Todo => write!(f, "TODO"),
        }
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, Copy, Error)]
#[error("unknown size category")]
pub struct ParseWhatError;

impl FromStr for What {
    type Err = ParseWhatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "fixedheader" => What::FixedHeader,
            "funcdata" => What::FuncData,
            "pcsp" => What::PcSp,
            "pcfile" => What::PcFile,
            "pcln" => What::PcLn,
            "text" => What::Text,
            "funcname" => What::FuncName,
            "TODO" => What::Todo,
            _ => {
                let rest = s.strip_prefix("pcdata").ok_or(ParseWhatError)?;
                let digits = rest.split('-').next().unwrap_or(rest);
                What::PcData(digits.parse().map_err(|_| ParseWhatError)?)
            }
        })
    }
}

impl Serialize for What {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for What {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One attribution record: a run of bytes charged to a function, its
/// package and a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Function name; empty on the remainder row.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Package name derived from the function name; may be empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package: String,
    /// The category the bytes belong to.
    pub what: What,
    /// Number of bytes.
    pub size: i64,
}
