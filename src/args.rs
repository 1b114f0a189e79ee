use std::{
    ffi::OsStr,
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{number::parse_number, InputSpec, Limits, MergeError, Offset, DEFAULT_OUTPUT};

/// Validates a `--size` value: `1..=limits.size_max()`.
pub fn parse_size(s: &str, limits: &Limits) -> Result<u64, MergeError> {
    match parse_number(s) {
        Some(size) if (1..=limits.size_max()).contains(&size) => Ok(size),
        _ => Err(MergeError::InvalidSize(s.to_owned())),
    }
}

/// Validates a `--pad` value: `0x00..=0xFF`.
pub fn parse_pad(s: &str) -> Result<u8, MergeError> {
    parse_number(s)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| MergeError::InvalidPad(s.to_owned()))
}

/// An address past the largest image `--size` accepts is refused.
fn parse_offset(s: &[u8], limits: &Limits) -> Result<Offset, MergeError> {
    let text = std::str::from_utf8(s).ok();
    match text.map(|t| (t, parse_number(t))) {
        Some((_, Some(addr))) if addr <= limits.size_max() => Ok(Offset::At(addr)),
        Some(("+", None)) => Ok(Offset::Follow),
        _ => Err(MergeError::InvalidOffset(
            String::from_utf8_lossy(s).into_owned(),
        )),
    }
}

/// Cuts to `path_len_max - 1` bytes, like a fixed C buffer would.
fn truncate_path(s: &[u8], limits: &Limits) -> PathBuf {
    let end = limits.path_len_max.saturating_sub(1);
    if s.len() <= end {
        return Path::new(OsStr::from_bytes(s)).to_owned();
    }
    let path = Path::new(OsStr::from_bytes(&s[..end])).to_owned();
    debug!("path cut to {end} bytes: {}", path.display());
    path
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Positionals {
    pub inputs: Vec<InputSpec>,
    pub output: PathBuf,
}

/// Splits the positional arguments into inputs and the output path.
///
/// Every token containing `@` is an input, in command line order. The first
/// token without `@` names the output and ends the list; anything after it
/// is ignored. Paths are taken as raw bytes.
pub fn parse_positionals<S: AsRef<OsStr>>(
    tokens: &[S],
    limits: &Limits,
) -> Result<Positionals, MergeError> {
    let mut inputs = Vec::new();
    let mut output = None;

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref().as_bytes();
        let Some(at) = token.iter().position(|&b| b == b'@') else {
            output = Some(truncate_path(token, limits));
            if i + 1 < tokens.len() {
                debug!("ignoring {} argument(s) after output", tokens.len() - i - 1);
            }
            break;
        };

        let offset = parse_offset(&token[..at], limits)?;
        if inputs.len() == limits.max_inputs {
            return Err(MergeError::TooManyInputs {
                max: limits.max_inputs,
            });
        }

        let input = InputSpec {
            offset,
            path: truncate_path(&token[at + 1..], limits),
        };
        debug!("input #{}: {} @ {}", inputs.len(), input.offset, input.path.display());
        inputs.push(input);
    }

    Ok(Positionals {
        inputs,
        output: output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
    })
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, os::unix::ffi::OsStringExt};

    use super::*;

    #[test]
    fn test_size_range() {
        let limits = Limits::default();
        assert_eq!(parse_size("0x10000", &limits).unwrap(), 0x10000);
        assert_eq!(parse_size("2147483648", &limits).unwrap(), 2u64 << 30);
        assert!(matches!(
            parse_size("0", &limits),
            Err(MergeError::InvalidSize(_))
        ));
        assert!(matches!(
            parse_size("2147483649", &limits),
            Err(MergeError::InvalidSize(_))
        ));
        assert!(matches!(
            parse_size("big", &limits),
            Err(MergeError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_pad_range() {
        assert_eq!(parse_pad("0").unwrap(), 0);
        assert_eq!(parse_pad("0xff").unwrap(), 0xff);
        assert_eq!(parse_pad("170").unwrap(), 0xaa);
        assert!(matches!(parse_pad("256"), Err(MergeError::InvalidPad(_))));
        assert!(matches!(parse_pad("-1"), Err(MergeError::InvalidPad(_))));
        assert!(matches!(parse_pad("0x"), Err(MergeError::InvalidPad(_))));
    }

    #[test]
    fn test_positionals() {
        let limits = Limits::default();
        let p = parse_positionals(
            &["0@boot.bin", "0x2000@app.bin", "+@data@v2.bin", "fw.bin", "extra"],
            &limits,
        )
        .unwrap();

        assert_eq!(
            p.inputs,
            [
                InputSpec {
                    offset: Offset::At(0),
                    path: "boot.bin".into()
                },
                InputSpec {
                    offset: Offset::At(0x2000),
                    path: "app.bin".into()
                },
                InputSpec {
                    offset: Offset::Follow,
                    path: "data@v2.bin".into()
                },
            ]
        );
        assert_eq!(p.output, PathBuf::from("fw.bin"));
    }

    #[test]
    fn test_default_output() {
        let p = parse_positionals(&["+@a.bin"], &Limits::default()).unwrap();
        assert_eq!(p.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(p.inputs.len(), 1);
    }

    #[test]
    fn test_illegal_offset() {
        let limits = Limits::default();
        for token in ["x@a.bin", "@a.bin", "++@a.bin", "-4@a.bin", "0x1g@a.bin"] {
            assert!(
                matches!(
                    parse_positionals(&[token], &limits),
                    Err(MergeError::InvalidOffset(_))
                ),
                "{token}"
            );
        }
    }

    #[test]
    fn test_offset_bound() {
        let limits = Limits::default();
        let p = parse_positionals(&["0x80000000@a.bin"], &limits).unwrap();
        assert_eq!(p.inputs[0].offset, Offset::At(limits.size_max()));

        for token in ["0x80000001@a.bin", "0xffffffffffffffff@a.bin"] {
            assert!(
                matches!(
                    parse_positionals(&[token], &limits),
                    Err(MergeError::InvalidOffset(_))
                ),
                "{token}"
            );
        }
    }

    #[test]
    fn test_input_cap() {
        let limits = Limits::default();
        let eight: Vec<String> = (0..8).map(|i| format!("+@{i}.bin")).collect();
        assert_eq!(parse_positionals(&eight, &limits).unwrap().inputs.len(), 8);

        let mut nine = eight.clone();
        nine.push("+@8.bin".to_owned());
        assert!(matches!(
            parse_positionals(&nine, &limits),
            Err(MergeError::TooManyInputs { max: 8 })
        ));

        // Tokens after the output are never looked at.
        let mut trailing = eight;
        trailing.push("out.bin".to_owned());
        trailing.push("+@8.bin".to_owned());
        assert!(parse_positionals(&trailing, &limits).is_ok());
    }

    #[test]
    fn test_path_truncation() {
        let limits = Limits {
            path_len_max: 8,
            ..Limits::default()
        };
        let p = parse_positionals(&["0@abcdefghij", "0123456789"], &limits).unwrap();
        assert_eq!(p.inputs[0].path, PathBuf::from("abcdefg"));
        assert_eq!(p.output, PathBuf::from("0123456"));

        // Bytes, not characters: the cut may land inside a UTF-8 sequence.
        let p = parse_positionals(&["0@abcdefé"], &limits).unwrap();
        assert_eq!(p.inputs[0].path.as_os_str().as_bytes(), b"abcdef\xc3");
    }

    #[test]
    fn test_non_utf8() {
        let limits = Limits::default();
        let tokens = [
            OsString::from_vec(b"0x10@x\xff.bin".to_vec()),
            OsString::from_vec(b"out\xfe.bin".to_vec()),
        ];
        let p = parse_positionals(&tokens, &limits).unwrap();

        assert_eq!(p.inputs[0].offset, Offset::At(0x10));
        assert_eq!(p.inputs[0].path.as_os_str().as_bytes(), b"x\xff.bin");
        assert_eq!(p.output.as_os_str().as_bytes(), b"out\xfe.bin");

        let bad = [OsString::from_vec(b"1\xff@a.bin".to_vec())];
        assert!(matches!(
            parse_positionals(&bad, &limits),
            Err(MergeError::InvalidOffset(_))
        ));
    }
}
