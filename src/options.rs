//! Contains all of the types needed to specify options to MongoDB operations.
//!
//! Most of the options structs in this module use the
//! [`typed-builder`](https://crates.io/crates/typed-builder) crate to derive a type-safe builder
//! API on them.

pub use crate::{
    client::options::{
        AggregateOptions,
        ClientOptions,
        RunCommandOptions,
        ServerAddress,
    },
    concern::{Acknowledgment, WriteConcern},
    read_preference::{ReadPreference, ReadPreferenceOptions, TagSet},
};
