use std::error::Error;

/// Errors that can be shown in the log view.
///
/// Every handler error maps to one fixed line of text. The detail stays in
/// the error value and goes to the diagnostic log through [`report`].
pub trait UserFacing: Error {
    fn user_message(&self) -> String;
}

/// Log the full error chain and return the line to show the user.
pub fn report<E: UserFacing>(err: &E) -> String {
    log::warn!("{}", chain(err));
    err.user_message()
}

fn chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
