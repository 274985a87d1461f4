//! Configuration merging, operation selection and required-field checks.

mod helpers;
