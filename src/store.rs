use crate::codec::{self, DecodeError, EncodeError};
use crate::config::{Field, Params, ParseError};

/// Owner of the live parameter set.
///
/// Every mutation either completes or leaves the set untouched, so a frame
/// that calls [`ParamStore::snapshot`] between mutations never sees a mix.
/// Every float the store holds is finite.
#[derive(Clone, Debug, Default)]
pub struct ParamStore {
    current: Params,
}

impl ParamStore {
    pub fn new(initial: Params) -> Result<Self, ParseError> {
        initial.validate()?;
        Ok(Self { current: initial })
    }

    /// Copy of the current set for one frame.
    #[inline]
    pub fn snapshot(&self) -> Params {
        self.current
    }

    /// Apply one UI event: parse `raw` for `field` and write it.
    pub fn apply(&mut self, field: Field, raw: &str) -> Result<(), ParseError> {
        let value = field.parse_value(raw)?;
        self.current.set(field, value)
    }

    /// Like [`ParamStore::apply`] with the field given by its snapshot key.
    pub fn apply_named(&mut self, key: &str, raw: &str) -> Result<(), ParseError> {
        self.apply(key.parse()?, raw)
    }

    /// Swap in a complete set. A set with a non-finite float changes nothing.
    pub fn replace(&mut self, candidate: Params) -> Result<(), ParseError> {
        candidate.validate()?;
        self.current = candidate;
        Ok(())
    }

    /// Bulk replace from raw `(key, value)` pairs. Every field must be present
    /// and parse; otherwise nothing changes.
    pub fn replace_raw<K, V>(&mut self, pairs: &[(K, V)]) -> Result<(), ParseError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut candidate = self.current;
        let mut seen = [false; Field::COUNT];
        for (key, raw) in pairs {
            let field: Field = key.as_ref().parse()?;
            candidate.set(field, field.parse_value(raw.as_ref())?)?;
            if let Some(i) = Field::ALL.iter().position(|f| *f == field) {
                seen[i] = true;
            }
        }
        if let Some(i) = seen.iter().position(|s| !s) {
            return Err(ParseError::MissingField(Field::ALL[i]));
        }
        self.replace(candidate)
    }

    /// Decode a text snapshot and swap it in. A bad snapshot changes nothing.
    pub fn import(&mut self, text: &str) -> Result<(), DecodeError> {
        // decode only yields finite sets
        self.current = codec::decode(text)?;
        Ok(())
    }

    pub fn export(&self) -> Result<String, EncodeError> {
        codec::encode(&self.current)
    }
}
