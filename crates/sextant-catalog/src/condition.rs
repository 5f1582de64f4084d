//! Condition expression text normalization.
//!
//! Sequence-flow conditions arrive as raw markup text, often wrapped in an
//! expression language's delimiters (`${...}`, `#{...}`) and sometimes in a
//! CDATA section as well. Downstream consumers want the plain condition, so
//! [`plain_text`] peels those wrappers off and collapses whitespace.

use winnow::{
    Parser as _,
    combinator::{alt, delimited, preceded},
    error::ModalResult,
    token::{rest, take_until},
};

/// `<![CDATA[ ... ]]>`, returning the inner text.
fn cdata<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<![CDATA[", take_until(0.., "]]>"), "]]>").parse_next(input)
}

/// `${ ... }` or `#{ ... }`, returning the body.
///
/// The body runs to the final closing brace, so nested braces inside the
/// expression survive.
fn expression<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(alt(("${", "#{")), rest)
        .verify(|body: &str| body.ends_with('}'))
        .map(|body: &'a str| &body[..body.len() - 1])
        .parse_next(input)
}

/// Strips expression delimiters and CDATA wrappers from a condition and
/// collapses runs of whitespace to single spaces.
///
/// Text that is not wrapped is returned trimmed, so the function is safe to
/// apply to any condition.
///
/// # Examples
///
/// ```
/// use sextant_catalog::condition::plain_text;
///
/// assert_eq!(plain_text("${ amount > 1000 }"), "amount > 1000");
/// assert_eq!(plain_text("<![CDATA[#{approved == true}]]>"), "approved == true");
/// assert_eq!(plain_text("  risk\n  == 'high' "), "risk == 'high'");
/// ```
pub fn plain_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let unwrapped = cdata.parse(trimmed).map(str::trim).unwrap_or(trimmed);
    let body = expression.parse(unwrapped).unwrap_or(unwrapped);
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn body_strategy() -> impl Strategy<Value = String> {
        "[a-z0-9 =<>!&|'.]{0,40}"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Normalizing twice gives the same result as normalizing once.
    fn check_idempotent(raw: &str) -> Result<(), TestCaseError> {
        let once = plain_text(raw);
        let twice = plain_text(&once);
        prop_assert_eq!(once, twice);
        Ok(())
    }

    /// A wrapped body normalizes to the same text as the bare body.
    fn check_wrapper_transparent(body: &str) -> Result<(), TestCaseError> {
        let bare = plain_text(body);
        prop_assert_eq!(plain_text(&format!("${{{body}}}")), bare.clone());
        prop_assert_eq!(plain_text(&format!("#{{{body}}}")), bare.clone());
        prop_assert_eq!(plain_text(&format!("<![CDATA[${{{body}}}]]>")), bare);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn normalization_is_idempotent(body in body_strategy()) {
            check_idempotent(&body)?;
            check_idempotent(&format!("${{{body}}}"))?;
        }

        #[test]
        fn wrappers_are_transparent(body in body_strategy()) {
            check_wrapper_transparent(&body)?;
        }
    }
}
