//! Error enums shared by the repository ports.
//!
//! Every repository reports infrastructure faults through the same
//! `Connection`/`Query` pair, worded after the repository, next to its own
//! ownership and rejection variants. [`define_port_error!`] writes the pair,
//! one snake_case constructor per variant, and the [`RepositoryFailure`]
//! impl the adapters map driver failures through.

/// Infrastructure failures any repository port can report.
pub trait RepositoryFailure: Sized {
    /// The backing store could not be reached.
    fn connection_failed(message: impl Into<String>) -> Self;

    /// A statement failed while it ran.
    fn query_failed(message: impl Into<String>) -> Self;
}

macro_rules! define_port_error {
    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident for $subject:literal {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            /// Repository connection could not be established.
            #[error("{subject} connection failed: {message}", subject = $subject)]
            Connection { message: String },
            /// Query or mutation failed during execution.
            #[error("{subject} query failed: {message}", subject = $subject)]
            Query { message: String },
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field : $ty),* },
            )*
        }

        impl $name {
            define_port_error!(@ctor Connection { message: String });
            define_port_error!(@ctor Query { message: String });
            $(
                define_port_error!(@ctor $variant { $($field : $ty),* });
            )*
        }

        impl $crate::domain::ports::RepositoryFailure for $name {
            fn connection_failed(message: impl Into<String>) -> Self {
                Self::connection(message)
            }

            fn query_failed(message: impl Into<String>) -> Self {
                Self::query(message)
            }
        }
    };
}

pub(crate) use define_port_error;
