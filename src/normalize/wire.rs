//! Text forms of binary wire values that have no dedicated [`ColumnValue`]
//! variant, written the way the server prints them.
//!
//! [`ColumnValue`]: super::ColumnValue

use std::error::Error;
use std::fmt::Write;

pub type DecodeError = Box<dyn Error + Sync + Send>;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_MINUTE: u64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: u64 = 60 * MICROS_PER_MINUTE;

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() < n {
            return Err("unexpected end of value".into());
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into()?))
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into()?))
    }

    fn i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into()?))
    }

    fn finish(&self) -> Result<(), DecodeError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(format!("{} trailing bytes", self.buf.len()).into())
        }
    }
}

/// Exact decimal text of a NUMERIC value: `NaN`, `Infinity`, `-Infinity`
/// or digits with `dscale` fractional places.
pub fn numeric_text(raw: &[u8]) -> Result<String, DecodeError> {
    let mut r = Reader::new(raw);
    let ndigits = r.i16()?;
    let weight = i32::from(r.i16()?);
    let sign = r.u16()?;
    let dscale = usize::from(r.u16()?);

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign 0x{:04x}", other).into()),
    }
    if ndigits < 0 {
        return Err("negative numeric digit count".into());
    }

    let digits = (0..ndigits)
        .map(|_| r.u16())
        .collect::<Result<Vec<u16>, DecodeError>>()?;
    r.finish()?;

    // Group i of `digits` is worth 10000^(weight - i).
    let group = |idx: i32| -> u16 {
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }

    if weight < 0 {
        text.push('0');
    } else {
        write!(text, "{}", group(0))?;
        for idx in 1..=weight {
            write!(text, "{:04}", group(idx))?;
        }
    }

    if dscale > 0 {
        let mut fraction = String::new();
        let groups = dscale.div_ceil(4) as i32;
        for k in 1..=groups {
            write!(fraction, "{:04}", group(weight + k))?;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    Ok(text)
}

/// Postgres-style interval text, e.g. `1 year 2 mons 3 days 04:05:06.5`.
pub fn interval_text(raw: &[u8]) -> Result<String, DecodeError> {
    let mut r = Reader::new(raw);
    let micros = r.i64()?;
    let days = r.i32()?;
    let months = r.i32()?;
    r.finish()?;

    let mut parts = Vec::new();
    let (years, mons) = (months / 12, months % 12);
    if years != 0 {
        parts.push(unit(years, "year"));
    }
    if mons != 0 {
        parts.push(unit(mons, "mon"));
    }
    if days != 0 {
        parts.push(unit(days, "day"));
    }
    if micros != 0 || parts.is_empty() {
        parts.push(clock(micros));
    }
    Ok(parts.join(" "))
}

fn unit(n: i32, name: &str) -> String {
    format!("{} {}{}", n, name, if n == 1 { "" } else { "s" })
}

fn clock(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let mut text = format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        abs / MICROS_PER_HOUR,
        abs % MICROS_PER_HOUR / MICROS_PER_MINUTE,
        abs % MICROS_PER_MINUTE / MICROS_PER_SECOND,
    );
    let fraction = abs % MICROS_PER_SECOND;
    if fraction != 0 {
        let digits = format!("{:06}", fraction);
        text.push('.');
        text.push_str(digits.trim_end_matches('0'));
    }
    text
}

pub fn uuid_text(raw: &[u8]) -> Result<String, DecodeError> {
    if raw.len() != 16 {
        return Err(format!("uuid must be 16 bytes, got {}", raw.len()).into());
    }
    let mut text = String::with_capacity(36);
    for (i, byte) in raw.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            text.push('-');
        }
        write!(text, "{:02x}", byte)?;
    }
    Ok(text)
}

/// `\x` followed by lowercase hex, the server's default bytea output.
pub fn bytea_text(raw: &[u8]) -> String {
    let mut text = String::with_capacity(2 + raw.len() * 2);
    text.push_str("\\x");
    for byte in raw {
        let _ = write!(text, "{:02x}", byte);
    }
    text
}

/// Array literal such as `{1,2,NULL}` or `{{a,b},{c,d}}`, with `element`
/// rendering each non-null element.
pub fn array_text(
    raw: &[u8],
    element: &dyn Fn(&[u8]) -> Result<String, DecodeError>,
) -> Result<String, DecodeError> {
    let mut r = Reader::new(raw);
    let ndim = r.i32()?;
    if ndim < 0 {
        return Err("negative array dimension count".into());
    }
    let _has_nulls = r.i32()?;
    let _element_oid = r.i32()?;

    let mut dims = Vec::with_capacity(ndim as usize);
    let mut bounds = String::new();
    for _ in 0..ndim {
        let len = r.i32()?;
        let lower = r.i32()?;
        if len < 0 {
            return Err("negative array dimension".into());
        }
        dims.push(len as usize);
        write!(bounds, "[{}:{}]", lower, lower + len - 1)?;
    }

    if dims.is_empty() {
        r.finish()?;
        return Ok("{}".to_string());
    }

    let mut text = String::new();
    // Bounds are only printed when some dimension does not start at 1.
    if !bounds.split(']').all(|b| b.is_empty() || b.starts_with("[1:")) {
        text.push_str(&bounds);
        text.push('=');
    }
    write_dimension(&mut r, &dims, element, &mut text)?;
    r.finish()?;
    Ok(text)
}

fn write_dimension(
    r: &mut Reader<'_>,
    dims: &[usize],
    element: &dyn Fn(&[u8]) -> Result<String, DecodeError>,
    text: &mut String,
) -> Result<(), DecodeError> {
    text.push('{');
    for i in 0..dims[0] {
        if i > 0 {
            text.push(',');
        }
        if dims.len() > 1 {
            write_dimension(r, &dims[1..], element, text)?;
            continue;
        }
        let len = r.i32()?;
        if len < 0 {
            text.push_str("NULL");
        } else {
            let value = element(r.take(len as usize)?)?;
            text.push_str(&quote_array_element(&value));
        }
    }
    text.push('}');
    Ok(())
}

fn quote_array_element(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.eq_ignore_ascii_case("null")
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | ',' | '"' | '\\'));
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
