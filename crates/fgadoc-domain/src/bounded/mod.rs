//! Depth-bounded native representation of the model.
//!
//! The userset and parameter-type grammars are recursive. The native form
//! unrolls both to a fixed depth so it can be described by a static schema.
//! Nothing nested deeper than [`MAX_RECURSION_DEPTH`] survives the trip:
//! encoding silently truncates, decoding shrinks the tree around the gaps.

mod codec;
mod native;
mod schema;

pub use codec::{
    check_native_model, decode_model, decode_param_type, decode_userset, encode_model,
    encode_param_type, encode_userset,
};
pub use native::{
    NativeAuthorizationModel, NativeCondition, NativeDifference, NativeParamTypeRef,
    NativeTupleToUserset, NativeTypeDefinition, NativeUserset, NativeUsersets,
};
pub use schema::{native_model_schema, AttributeKind, AttributeSchema};

/// Number of userset (or parameter type) levels the native form can hold.
/// A tree of this depth round-trips; one level more does not.
pub const MAX_RECURSION_DEPTH: usize = 5;
