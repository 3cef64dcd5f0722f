//! Decoder fuzz target: arbitrary bytes decoded against a fixed schema covering every
//! definition kind. Decoding must return Ok or Err, never panic or over-allocate.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
const SCHEMA: &str = r#"
enum Kind { A = 1; B = 2; }
smol Flag { ON = 1; }
struct Point { float x; lowp y; int16[] z; }
message Node {
  uint id = 1;
  string name = 2;
  Point[] points = 3;
  Node next = 4;
  Kind kind = 5;
  Flag flag = 6;
  byte[] blob = 7;
  Shape shape = 8;
}
union Shape = Point | Node;
"#;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Ok(schema) = peechy::parse(SCHEMA) else {
        return;
    };
    let Ok(resolved) = peechy::ResolvedSchema::resolve(schema) else {
        return;
    };
    let codec = peechy::Codec::new(resolved);
    if let Ok(value) = codec.decode("Node", data) {
        let _ = peechy::dump_value(&value);
        assert!(codec.encode("Node", &value).is_ok(), "decoded value must re-encode");
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
