use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const ALPHABET: &str =
    "123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";
// base58 of u64::MAX is 11 characters long
const MAX_LEN: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UidError {
    #[error("A uid can not be empty")]
    Empty,
    #[error("Uid is {len} characters long, at most {MAX_LEN} are allowed")]
    TooLong { len: usize },
    #[error("Character {ch:?} at position {position} is not valid base58")]
    InvalidCharacter { ch: char, position: usize },
    #[error("Uid does not fit in 64 bits")]
    Overflow,
}

/// Base58 encoded identifier of a single bricklet, for example `"Dq2"`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn decode(text: &str) -> Result<u64, UidError> {
    if text.is_empty() {
        return Err(UidError::Empty);
    }
    let len = text.chars().count();
    if len > MAX_LEN {
        return Err(UidError::TooLong { len });
    }

    text.chars().enumerate().try_fold(0u64, |acc, (position, ch)| {
        let digit = ALPHABET
            .find(ch)
            .ok_or(UidError::InvalidCharacter { ch, position })?;
        acc.checked_mul(58)
            .and_then(|acc| acc.checked_add(digit as u64))
            .ok_or(UidError::Overflow)
    })
}

impl FromStr for Uid {
    type Err = UidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)?;
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for Uid {
    type Error = UidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode(&value)?;
        Ok(Self(value))
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_real_uids() {
        for text in ["Dq2", "LmK", "6CN7vT", "zzzzzz"] {
            let uid: Uid = text.parse().unwrap();
            assert_eq!(uid.as_str(), text);
        }
    }

    #[test]
    fn decodes_with_one_as_zero() {
        assert_eq!(decode("21"), Ok(58));
        assert_eq!(decode("1"), Ok(0));
        assert_eq!(decode("z"), Ok(32));
    }

    #[test]
    fn rejects_ambiguous_characters() {
        // 0, O, I and l are not part of base58
        assert_eq!(
            "a0b".parse::<Uid>(),
            Err(UidError::InvalidCharacter {
                ch: '0',
                position: 1
            })
        );
        assert!(matches!(
            "lO".parse::<Uid>(),
            Err(UidError::InvalidCharacter { ch: 'l', .. })
        ));
    }

    #[test]
    fn rejects_empty_and_long() {
        assert_eq!("".parse::<Uid>(), Err(UidError::Empty));
        assert_eq!(
            "111111111111".parse::<Uid>(),
            Err(UidError::TooLong { len: 12 })
        );
        assert_eq!("ZZZZZZZZZZZ".parse::<Uid>(), Err(UidError::Overflow));
    }
}
