//! Service filter verification.
//!
//! Dependency and adapter annotations may carry an LDAP-style filter
//! (`(&(objectClass=foo)(rank>=3))`). The collector only needs a yes/no
//! answer, so verification sits behind [`FilterVerifier`].

/// Checks the syntax of a filter string.
pub trait FilterVerifier: Send + Sync {
    /// Returns a description of the problem when `filter` is invalid.
    fn verify(&self, filter: &str) -> Result<(), String>;
}

impl<F> FilterVerifier for F
where
    F: Fn(&str) -> Result<(), String> + Send + Sync,
{
    fn verify(&self, filter: &str) -> Result<(), String> {
        self(filter)
    }
}

/// Accepts every filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilters;

impl FilterVerifier for AcceptAllFilters {
    fn verify(&self, _filter: &str) -> Result<(), String> {
        Ok(())
    }
}

/// RFC 1960 filter syntax checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapFilterVerifier;

impl FilterVerifier for LdapFilterVerifier {
    fn verify(&self, filter: &str) -> Result<(), String> {
        let mut parser = FilterParser {
            input: filter.as_bytes(),
            pos: 0,
        };
        parser.parse_filter()?;
        parser.skip_whitespace();
        if parser.pos != parser.input.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(())
    }
}

struct FilterParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl FilterParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn error(&self, reason: &str) -> String {
        format!("{} at offset {}", reason, self.pos)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), String> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected as char)))
        }
    }

    fn parse_filter(&mut self) -> Result<(), String> {
        self.skip_whitespace();
        self.expect(b'(')?;
        self.skip_whitespace();
        match self.peek() {
            Some(b'&') | Some(b'|') => {
                self.pos += 1;
                self.parse_filter_list()?;
            }
            Some(b'!') => {
                self.pos += 1;
                self.parse_filter()?;
            }
            Some(_) => self.parse_item()?,
            None => return Err(self.error("unexpected end of filter")),
        }
        self.skip_whitespace();
        self.expect(b')')
    }

    fn parse_filter_list(&mut self) -> Result<(), String> {
        let mut count = 0;
        self.skip_whitespace();
        while self.peek() == Some(b'(') {
            self.parse_filter()?;
            self.skip_whitespace();
            count += 1;
        }
        if count == 0 {
            return Err(self.error("empty filter list"));
        }
        Ok(())
    }

    fn parse_item(&mut self) -> Result<(), String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'=' | b'~' | b'<' | b'>' | b'(' | b')') {
                break;
            }
            self.pos += 1;
        }
        if self.input[start..self.pos].trim_ascii().is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let allows_wildcard = match self.peek() {
            Some(b'=') => {
                self.pos += 1;
                true
            }
            Some(b'~') | Some(b'<') | Some(b'>') => {
                self.pos += 1;
                self.expect(b'=')?;
                false
            }
            _ => return Err(self.error("missing filter operator")),
        };

        self.parse_value(allows_wildcard)
    }

    fn parse_value(&mut self, allows_wildcard: bool) -> Result<(), String> {
        while let Some(b) = self.peek() {
            match b {
                b')' => return Ok(()),
                b'(' => return Err(self.error("unescaped '(' in value")),
                b'*' if !allows_wildcard => {
                    return Err(self.error("wildcard not allowed with this operator"));
                }
                b'\\' => {
                    self.pos += 1;
                    if self.peek().is_none() {
                        return Err(self.error("dangling escape"));
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(self.error("unterminated filter item"))
    }
}
