// Code generated by peechy from package demo. DO NOT EDIT.

use peechy::{ByteBuffer, CodecError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[allow(non_camel_case_types)]
pub enum Region {
    CALIFORNIA = 1,
    OREGON = 2,
}

impl Region {
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::CALIFORNIA),
            2 => Some(Self::OREGON),
            _ => None,
        }
    }

    pub fn encode(&self, bb: &mut ByteBuffer) {
        bb.write_var_uint(*self as u32);
    }

    pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {
        let value = bb.read_var_uint()?;
        Self::from_value(value).ok_or_else(|| CodecError::InvalidEnumValue {
            name: "Region".to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn encode(&self, bb: &mut ByteBuffer) {
        let Self { x, y } = self;
        bb.write_var_float(*x);
        bb.write_var_float(*y);
    }

    pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {
        let x = bb.read_var_float()?;
        let y = bb.read_var_float()?;
        Ok(Self { x, y })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    pub a: Option<u32>,
    pub b: Option<String>,
    pub c: Option<Vec<u32>>,
    pub points: Option<Vec<Point>>,
}

impl Sample {
    pub fn encode(&self, bb: &mut ByteBuffer) {
        let Self { a, b, c, points } = self;
        if let Some(value) = a {
            bb.write_var_uint(1);
            bb.write_var_uint(*value);
        }
        if let Some(value) = b {
            bb.write_var_uint(2);
            bb.write_string(value);
        }
        if let Some(value) = c {
            bb.write_var_uint(3);
            bb.write_u32_array(value);
        }
        if let Some(value) = points {
            bb.write_var_uint(4);
            bb.write_var_uint(value.len() as u32);
            for item in value.iter() {
                item.encode(bb);
            }
        }
        bb.write_var_uint(0);
    }

    pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {
        let mut a = None;
        let mut b = None;
        let mut c = None;
        let mut points = None;
        loop {
            match bb.read_var_uint()? {
                0 => break,
                1 => a = Some(bb.read_var_uint()?),
                2 => b = Some(bb.read_string()?),
                3 => c = Some(bb.read_u32_array()?),
                4 => points = Some({
                    let count = bb.read_var_uint()? as usize;
                    if count > bb.remaining() {
                        return Err(CodecError::ArrayLength { count, remaining: bb.remaining() });
                    }
                    let mut items = Vec::with_capacity(count);
                    for _ in 0..count {
                        items.push(Point::decode(bb)?);
                    }
                    items
                }),
                tag => {
                    return Err(CodecError::InvalidFieldTag {
                        message: "Sample".to_string(),
                        tag,
                    })
                }
            }
        }
        Ok(Self {
            a,
            b,
            c,
            points,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub value: Option<i32>,
    pub next: Option<Box<Node>>,
}

impl Node {
    pub fn encode(&self, bb: &mut ByteBuffer) {
        let Self { value, next } = self;
        if let Some(value) = value {
            bb.write_var_uint(1);
            bb.write_var_int(*value);
        }
        if let Some(value) = next {
            bb.write_var_uint(2);
            value.encode(bb);
        }
        bb.write_var_uint(0);
    }

    pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {
        let mut value = None;
        let mut next = None;
        loop {
            match bb.read_var_uint()? {
                0 => break,
                1 => value = Some(bb.read_var_int()?),
                2 => next = Some(Box::new(Node::decode(bb)?)),
                tag => {
                    return Err(CodecError::InvalidFieldTag {
                        message: "Node".to_string(),
                        tag,
                    })
                }
            }
        }
        Ok(Self {
            value,
            next,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point),
    Sample(Sample),
}

impl Shape {
    pub const DISCRIMINATOR: &'static str = "kind";

    pub fn discriminant(&self) -> u32 {
        match self {
            Self::Point(_) => 1,
            Self::Sample(_) => 2,
        }
    }

    pub fn encode(&self, bb: &mut ByteBuffer) {
        bb.write_var_uint(self.discriminant());
        match self {
            Self::Point(value) => value.encode(bb),
            Self::Sample(value) => value.encode(bb),
        }
    }

    pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {
        match bb.read_var_uint()? {
            1 => Ok(Self::Point(Point::decode(bb)?)),
            2 => Ok(Self::Sample(Sample::decode(bb)?)),
            discriminant => Err(CodecError::InvalidUnionDiscriminant {
                union: "Shape".to_string(),
                discriminant,
            }),
        }
    }
}
