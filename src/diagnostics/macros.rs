//! Call-site macros.
//!
//! Each reporting macro owns a `static SuppressFlag`, so choosing
//! "suppress" in the error dialog silences exactly that call site.

/// Check an invariant; report through the error pipeline if it does not hold.
///
/// If the user picks "break", the break happens here in the caller's frame.
///
/// # Example
///
/// ```rust,ignore
/// diag_assert!(frame_index < frames.len());
/// ```
#[macro_export]
macro_rules! diag_assert {
    ($cond:expr $(,)?) => {{
        if !$cond {
            static SUPPRESS: $crate::SuppressFlag = $crate::SuppressFlag::new();
            let reaction = $crate::assertion_failed(
                stringify!($cond),
                Some(&SUPPRESS),
                file!(),
                line!(),
                module_path!(),
            );
            if reaction == $crate::ErrorReaction::Break {
                $crate::debug_break();
            }
        }
    }};
}

/// Report a warning message through the error pipeline.
///
/// # Example
///
/// ```rust,ignore
/// diag_warn!("texture {} has no mip levels", name);
/// ```
#[macro_export]
macro_rules! diag_warn {
    ($($arg:tt)+) => {{
        static SUPPRESS: $crate::SuppressFlag = $crate::SuppressFlag::new();
        let reaction = $crate::warn(
            &format!($($arg)+),
            Some(&SUPPRESS),
            file!(),
            line!(),
            module_path!(),
        );
        if reaction == $crate::ErrorReaction::Break {
            $crate::debug_break();
        }
    }};
}

/// Report an error code if it signals failure; evaluates to the code.
///
/// Codes `>= 0` are success and pass through silently.
///
/// # Example
///
/// ```rust,ignore
/// let ret = diag_warn_err!(vfs_mount(path));
/// ```
#[macro_export]
macro_rules! diag_warn_err {
    ($code:expr $(,)?) => {{
        let code: $crate::ErrorCode = ($code).into();
        if code.is_failure() {
            static SUPPRESS: $crate::SuppressFlag = $crate::SuppressFlag::new();
            let reaction = $crate::operation_failed(
                code,
                Some(&SUPPRESS),
                file!(),
                line!(),
                module_path!(),
            );
            if reaction == $crate::ErrorReaction::Break {
                $crate::debug_break();
            }
        }
        code
    }};
}

/// Append a formatted line to the activity log.
///
/// # Example
///
/// ```rust,ignore
/// diag_log!("loaded map {} in {} ms", name, elapsed);
/// ```
#[macro_export]
macro_rules! diag_log {
    ($($arg:tt)+) => {
        $crate::log_append(format_args!($($arg)+))
    };
}

/// Print a formatted line to the output channel, subject to the tag filter.
///
/// # Example
///
/// ```rust,ignore
/// diag_print!("render|frame {} started", n);
/// ```
#[macro_export]
macro_rules! diag_print {
    ($($arg:tt)+) => {
        $crate::debug_print(format_args!($($arg)+))
    };
}
