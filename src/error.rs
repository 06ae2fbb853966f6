// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

extern crate error_chain;
extern crate serde_json;

use std::borrow::Cow;
use std::sync::PoisonError;

error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    errors {
        Poisoned {
            description("a thread holding the locked panicked and poisoned the lock")
        }

        IllegalState(desc: String) {
            description(desc)
            display("Illegal state: {}", desc)
        }

        IllegalArgument(desc: String) {
            description(desc)
            display("Illegal argument: {}", desc)
        }

        CorruptIndex(errmsg: String) {
            description(errmsg)
            display("Corrupt Index: {}", errmsg)
        }

        UnsupportedOperation(errmsg: Cow<'static, str>) {
            description(errmsg),
            display("Unsupported Operation: {}", errmsg)
        }

        RuntimeError(errmsg: String) {
            description(errmsg)
            display("Runtime Error: {}", errmsg)
        }

        Merged(primary: Box<Error>, suppressed: Box<Error>) {
            description("an error was hit while cleaning up after an earlier error")
            display("{} (suppressed: {})", primary, suppressed)
        }
    }

    foreign_links {
        FmtError(::std::fmt::Error);
        IoError(::std::io::Error);
        FromUtf8Err(::std::string::FromUtf8Error);
        Utf8Error(::std::str::Utf8Error);
        SerdeJsonError(self::serde_json::Error);
    }
}

impl<Guard> From<PoisonError<Guard>> for Error {
    fn from(_: PoisonError<Guard>) -> Error {
        ErrorKind::Poisoned.into()
    }
}

/// Combines the outcome of a cleanup step with an error that may already be
/// in flight. The earlier error stays the primary cause.
pub fn merge_error(res: Result<()>, cleanup: Result<()>) -> Result<()> {
    match (res, cleanup) {
        (Ok(()), cleanup) => cleanup,
        (Err(e), Ok(())) => Err(e),
        (Err(primary), Err(suppressed)) => {
            Err(ErrorKind::Merged(Box::new(primary), Box::new(suppressed)).into())
        }
    }
}

impl Error {
    /// The error that started the failure, looking through merged cleanup errors.
    pub fn primary(&self) -> &Error {
        match *self.kind() {
            ErrorKind::Merged(ref primary, _) => primary.primary(),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_both_errors() {
        let first: Result<()> = Err(ErrorKind::IllegalArgument("first".into()).into());
        let second: Result<()> = Err(ErrorKind::IllegalState("second".into()).into());

        let merged = merge_error(first, second).unwrap_err();
        match *merged.kind() {
            ErrorKind::Merged(ref p, ref s) => {
                assert!(format!("{}", p).contains("first"));
                assert!(format!("{}", s).contains("second"));
            }
            ref k => panic!("unexpected kind {:?}", k),
        }
        match *merged.primary().kind() {
            ErrorKind::IllegalArgument(_) => {}
            ref k => panic!("unexpected primary {:?}", k),
        }
        let msg = format!("{}", merged);
        assert!(msg.contains("first") && msg.contains("second"));
    }

    #[test]
    fn merge_passes_through_single_outcome() {
        assert!(merge_error(Ok(()), Ok(())).is_ok());

        let cleanup_only: Result<()> = Err(ErrorKind::IllegalState("cleanup".into()).into());
        let res = merge_error(Ok(()), cleanup_only).unwrap_err();
        match *res.kind() {
            ErrorKind::IllegalState(ref m) => assert_eq!(m, "cleanup"),
            ref k => panic!("unexpected kind {:?}", k),
        }

        let first_only: Result<()> = Err(ErrorKind::IllegalArgument("first".into()).into());
        let res = merge_error(first_only, Ok(())).unwrap_err();
        match *res.kind() {
            ErrorKind::IllegalArgument(ref m) => assert_eq!(m, "first"),
            ref k => panic!("unexpected kind {:?}", k),
        }
    }
}
