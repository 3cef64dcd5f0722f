//! # peechy: schema language and compact binary codec
//!
//! A small interface definition language describing enums, structs, messages and unions,
//! plus the [`ByteBuffer`] wire codec every generated or dynamic encoder is built on.
//!
//! ## Schema structure
//!
//! - **enum** / **smol**: named values, encoded as a varuint / a single byte
//! - **struct**: every field present, in declaration order
//! - **message**: tagged optional fields (`= n`), terminated by tag `0`
//! - **union**: varuint member index (1-based) followed by the member
//! - **alias**: another name for a type
//!
//! ## Field types
//!
//! - `bool`, `byte`, `int8`, `int16`, `uint16`, `int32`, `uint32` (fixed, little-endian)
//! - `int`, `uint` (zig-zag / LEB128 varints), `float` (varfloat), `float32`, `lowp`
//! - `string` (length-prefixed UTF-8), and `T[]` arrays of any type
//!
//! ## Example schema
//!
//! ```text
//! package demo;
//!
//! enum Region {
//!   CALIFORNIA = 1;
//!   OREGON = 2;
//! }
//!
//! struct Point {
//!   float x;
//!   float y;
//! }
//!
//! message Hello {
//!   uint hour = 1;
//!   Point[] path = 2;
//!   Region region = 3 [required];
//! }
//! ```
//!
//! ## Usage
//!
//! Parse with [`parse`], verify with [`ResolvedSchema::resolve`], then either drive a
//! [`Codec`] with [`Value`]s or emit typed Rust with [`generate_rust`].

pub mod buffer;
pub mod codec;
pub mod codegen;
pub mod dump;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod value;

pub use buffer::{BufferError, ByteBuffer};
pub use codec::{Codec, CodecError};
pub use codegen::{generate_rust, GeneratorOptions};
pub use dump::dump_value;
pub use parser::{parse, parse_file};
pub use printer::pretty_print;
pub use schema::{Definition, DefinitionKind, Field, Primitive, ResolvedSchema, Schema, SchemaError};
pub use value::Value;
