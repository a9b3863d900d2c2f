//! Defines helper macros for generating store port error enums.

/// Declare a `thiserror` enum plus one snake-case constructor per variant.
///
/// Constructor parameters accept `impl Into<T>` so callers can pass `&str`
/// for `String` fields. Variant docs are repeated on the constructor.
macro_rules! define_port_error {
    (@ctor [$($doc:meta)*] $variant:ident) => {
        ::paste::paste! {
            $(#[$doc])*
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor [$($doc:meta)*] $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl [$($doc)*] $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl [$($doc:meta)*] $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            $(#[$doc])*
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (
        @ctor_impl [$($doc:meta)*] $variant:ident ($($params:tt)*) ($($inits:tt)*)
        $field:ident : $ty:ty, $($rest:tt)*
    ) => {
        define_port_error!(
            @ctor_impl
            [$($doc)*]
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(
                    @ctor [$($variant_meta)*] $variant $( { $($field : $ty),* } )?
                );
            )*
        }
    };
}

pub(crate) use define_port_error;
