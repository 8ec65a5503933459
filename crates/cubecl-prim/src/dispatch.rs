//! Selection of the vendor back-end.
//!
//! The back-end is chosen when the crate is built: the `hip` and `cuda` features enable one
//! back-end each, and with both of them (the `auto` feature) the build script picks one from
//! `HIP_PLATFORM` or the target architecture. Only the selected back-end is referenced.

use cubecl_prim_runtime::Backend;
use std::sync::Once;

cfg_if::cfg_if! {
    if #[cfg(prim_backend = "hip")] {
        /// The back-end every device algorithm dispatches to.
        pub type ActiveBackend = cubecl_prim_hip::HipBackend;
    } else if #[cfg(prim_backend = "cuda")] {
        /// The back-end every device algorithm dispatches to.
        pub type ActiveBackend = cubecl_prim_cuda::CudaBackend;
    } else {
        compile_error!("No back-end selected: enable the `hip`, `cuda` or `auto` feature");
    }
}

/// Name of the back-end selected at build time.
pub fn backend_name() -> &'static str {
    <ActiveBackend as Backend>::NAME
}

static DEBUG_SYNCHRONOUS: Once = Once::new();

/// Called by the deprecated entry points; the flag has no effect.
pub(crate) fn ignore_debug_synchronous(entry_point: &str, debug_synchronous: bool) {
    DEBUG_SYNCHRONOUS.call_once(|| {
        log::warn!(
            "{entry_point} is deprecated, the debug_synchronous flag ({debug_synchronous}) is ignored"
        );
    });
}

/// Generates a deprecated twin of an entry point taking an extra trailing `debug_synchronous`
/// flag, which is ignored.
macro_rules! debug_synchronous {
    (
        $(#[$meta:meta])*
        $name:ident => $modern:ident<$($generic:ident),*>($($arg:ident: $ty:ty),* $(,)?)
        where $($bounds:tt)*
    ) => {
        $(#[$meta])*
        #[deprecated(
            since = "0.1.0",
            note = "The debug_synchronous flag is ignored, call the entry point without it"
        )]
        #[allow(clippy::too_many_arguments)]
        pub fn $name<$($generic),*>(
            $($arg: $ty,)*
            debug_synchronous: bool,
        ) -> Result<(), $crate::PrimError>
        where
            $($bounds)*
        {
            $crate::dispatch::ignore_debug_synchronous(stringify!($name), debug_synchronous);
            $modern::<$($generic),*>($($arg),*)
        }
    };
}

pub(crate) use debug_synchronous;
