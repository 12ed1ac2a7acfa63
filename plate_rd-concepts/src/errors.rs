use core::fmt::Display;
use std::error::Error;

macro_rules! define_errors {
    ($(($err_name: ident, $err_descr: expr)),+) => {
        $(
            #[doc = $err_descr]
            #[derive(Debug, Clone, PartialEq)]
            pub struct $err_name(
                #[doc = "Error message associated with "]
                #[doc = stringify!($err_name)]
                #[doc = " error type."]
                pub String,
            );

            impl Display for $err_name {
                fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl Error for $err_name {}
        )+
    }
}

define_errors!(
    (
        ConfigurationError,
        "Invalid setup of a plate: duplicate species, wrong shapes or out-of-bounds coordinates"
    ),
    (CalcError, "General Calculation Error"),
    (
        TimeError,
        "Error related to advancing the simulation time or displaying its progress"
    )
);

impl From<String> for TimeError {
    fn from(value: String) -> Self {
        TimeError(value)
    }
}

impl From<String> for ConfigurationError {
    fn from(value: String) -> Self {
        ConfigurationError(value)
    }
}

macro_rules! impl_from_error {
    ($name: ident, $(($err_var: ident, $err_type: ty)),+) => {
        $(
            impl From<$err_type> for $name {
                fn from(err: $err_type) -> Self {
                    $name::$err_var(err)
                }
            }
        )+
    }
}

/// Covers every error which can be returned by operations on a plate.
#[derive(Clone, Debug, PartialEq)]
pub enum PlateError {
    /// See [ConfigurationError]
    ConfigurationError(ConfigurationError),
    /// See [CalcError]
    CalcError(CalcError),
    /// See [TimeError]
    TimeError(TimeError),
}

impl Display for PlateError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PlateError::ConfigurationError(e) => write!(f, "{}", e),
            PlateError::CalcError(e) => write!(f, "{}", e),
            PlateError::TimeError(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PlateError {}

impl_from_error! {PlateError,
    (ConfigurationError, ConfigurationError),
    (CalcError, CalcError),
    (TimeError, TimeError)
}
