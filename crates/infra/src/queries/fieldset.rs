//! Named access to positional response fields
//!
//! The record service takes field names on the request (`fieldset.list`) but
//! answers with positional keys: the first requested field comes back as
//! `f0`, the second as `f1`, and so on. A [`Fieldset`] owns that mapping so
//! the rest of the crate extracts fields by name and the positional scheme
//! never leaks past this module.

/// Ordered set of entity field names for one query
#[derive(Debug, Clone)]
pub struct Fieldset {
    names: &'static [&'static str],
}

impl Fieldset {
    #[must_use]
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// Comma-joined field names for the request's `fieldset.list` value.
    #[must_use]
    pub fn list(&self) -> String {
        self.names.join(",")
    }

    /// Positional response key (`fN`) for a named field.
    #[must_use]
    pub fn key(&self, name: &str) -> Option<String> {
        self.names.iter().position(|n| *n == name).map(|idx| format!("f{idx}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_preserves_declaration_order() {
        let fieldset = Fieldset::new(&["CODPAP", "NOMEPAP", "CGC_CPF"]);
        assert_eq!(fieldset.list(), "CODPAP,NOMEPAP,CGC_CPF");
    }

    #[test]
    fn key_follows_position() {
        let fieldset = Fieldset::new(&["CODPAP", "CODVEND", "NUMOS"]);
        assert_eq!(fieldset.key("CODPAP").as_deref(), Some("f0"));
        assert_eq!(fieldset.key("NUMOS").as_deref(), Some("f2"));
        assert_eq!(fieldset.key("UNKNOWN"), None);
    }
}
