//! Macros for declaring status enums and effect types.

/// Generate a `Status` implementation for simple lifecycle enums.
///
/// # Example
///
/// ```
/// use effectful::status_enum;
/// use effectful::core::Status;
///
/// status_enum! {
///     pub enum JobStatus {
///         Queued,
///         Running,
///         Done,
///     }
///     final: [Done]
/// }
///
/// assert_eq!(JobStatus::Running.name(), "Running");
/// assert!(JobStatus::Done.is_final());
/// ```
#[macro_export]
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::Status for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }
    };
}

/// Declare effect types together with the result type their performer
/// expects back.
///
/// Unit, tuple and named-field structs are supported. Attributes are passed
/// through unchanged and nothing is derived implicitly, so a declared type
/// carries exactly the derives written on it.
///
/// # Example
///
/// ```
/// use effectful::effect;
/// use effectful::core::Effect;
///
/// effect! {
///     /// Ask for the next line of input.
///     pub struct Read -> String;
///
///     #[derive(Debug, Clone)]
///     pub struct Print(pub String) -> ();
///
///     pub struct Lookup { pub key: String } -> Option<String>;
/// }
///
/// fn output_of<E: Effect>(_: &E) -> std::any::TypeId {
///     std::any::TypeId::of::<E::Output>()
/// }
///
/// assert_eq!(output_of(&Read), std::any::TypeId::of::<String>());
/// assert_eq!(output_of(&Print("hi".into())), std::any::TypeId::of::<()>());
/// ```
#[macro_export]
macro_rules! effect {
    () => {};

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident -> $output:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::core::Effect for $name {
            type Output = $output;
        }

        $crate::effect! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident ( $($field:tt)* ) -> $output:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis struct $name ( $($field)* );

        impl $crate::core::Effect for $name {
            type Output = $output;
        }

        $crate::effect! { $($rest)* }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($field:tt)* } -> $output:ty;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        $vis struct $name { $($field)* }

        impl $crate::core::Effect for $name {
            type Output = $output;
        }

        $crate::effect! { $($rest)* }
    };
}
