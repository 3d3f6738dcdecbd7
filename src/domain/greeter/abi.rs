//! Greeter contract interface descriptor
//!
//! The JSON ABI is embedded at build time and parsed once. Calls are
//! encoded and decoded through `alloy-dyn-abi` so the descriptor stays the
//! single source of truth for selectors and argument types.

use std::sync::OnceLock;

use alloy_dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{keccak256, Bytes};
use alloy_sol_types::sol;
use thiserror::Error;

/// Raw Greeter ABI as produced by the Solidity compiler
pub const GREETER_ABI_JSON: &str = include_str!("../../../abi/Greeter.json");

/// View function returning the current greeting
pub const GREET: &str = "greet";

/// Mutating function replacing the greeting
pub const SET_GREETING: &str = "setGreeting";

sol! {
    /// Typed mirror of the Greeter ABI, used for log decoding
    interface IGreeter {
        event SetGreeting(address sender, string greeting);

        function greet() external view returns (string memory);
        function setGreeting(string memory _greeting) external;
    }
}

#[derive(Debug, Error)]
pub enum GreeterError {
    #[error("function `{0}` is not part of the Greeter ABI")]
    UnknownFunction(String),

    #[error("`{function}` expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid argument for `{function}`: {source}")]
    Argument {
        function: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },

    #[error("failed to encode `{function}` call: {source}")]
    Encode {
        function: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },

    #[error("failed to decode `{function}` output: {source}")]
    Decode {
        function: String,
        #[source]
        source: alloy_dyn_abi::Error,
    },

    #[error("`{function}` returned no string value")]
    UnexpectedOutput { function: String },
}

/// Parsed Greeter ABI
pub fn descriptor() -> &'static JsonAbi {
    static ABI: OnceLock<JsonAbi> = OnceLock::new();
    ABI.get_or_init(|| {
        serde_json::from_str(GREETER_ABI_JSON).expect("embedded Greeter ABI is valid JSON")
    })
}

/// Short digest of the descriptor, used to detect descriptor changes
pub fn fingerprint() -> String {
    let hash = keccak256(GREETER_ABI_JSON.as_bytes());
    format!("0x{}", hex::encode(&hash[..8]))
}

/// Look up a function by name
pub fn function(name: &str) -> Result<&'static Function, GreeterError> {
    descriptor()
        .function(name)
        .and_then(|overloads| overloads.first())
        .ok_or_else(|| GreeterError::UnknownFunction(name.to_string()))
}

/// Encode a call to `name` with textual arguments
///
/// String parameters take the argument verbatim (empty strings included);
/// every other type goes through the dyn-abi string coercion.
pub fn encode_call(name: &str, args: &[String]) -> Result<Bytes, GreeterError> {
    let function = function(name)?;
    if function.inputs.len() != args.len() {
        return Err(GreeterError::ArgumentCount {
            function: name.to_string(),
            expected: function.inputs.len(),
            found: args.len(),
        });
    }

    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let kind = param.resolve().map_err(|source| GreeterError::Argument {
                function: name.to_string(),
                source,
            })?;
            match kind {
                DynSolType::String => Ok(DynSolValue::String(arg.clone())),
                other => other
                    .coerce_str(arg)
                    .map_err(|source| GreeterError::Argument {
                        function: name.to_string(),
                        source,
                    }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let calldata = function
        .abi_encode_input(&values)
        .map_err(|source| GreeterError::Encode {
            function: name.to_string(),
            source,
        })?;
    Ok(Bytes::from(calldata))
}

/// Calldata for `greet()`
pub fn encode_greet() -> Result<Bytes, GreeterError> {
    encode_call(GREET, &[])
}

/// Decode the return data of `greet()`
pub fn decode_greet(data: &[u8]) -> Result<String, GreeterError> {
    let function = function(GREET)?;
    let values = function
        .abi_decode_output(data)
        .map_err(|source| GreeterError::Decode {
            function: GREET.to_string(),
            source,
        })?;

    values
        .first()
        .and_then(DynSolValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| GreeterError::UnexpectedOutput {
            function: GREET.to_string(),
        })
}
