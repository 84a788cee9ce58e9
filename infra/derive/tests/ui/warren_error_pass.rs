use std::borrow::Cow;
use warren_derive::warren_error;

#[warren_error]
pub enum DeclarationError {
    #[error("Malformed declaration{}: {source}", format_context(.context))]
    Malformed {
        #[source]
        source: std::fmt::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal declaration error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn declare() -> Result<(), DeclarationError> {
    Err::<(), _>(std::fmt::Error).context("rendering collection path")?;
    Ok(())
}

fn main() {
    let err = declare().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Malformed declaration (rendering collection path): an error occurred when formatting an argument"
    );

    let internal: DeclarationError = "broken tree".into();
    assert_eq!(internal.to_string(), "Internal declaration error: broken tree");
}
