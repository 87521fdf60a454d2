//! Macros for ergonomic chart declaration.

/// Generate a typed set of state names.
///
/// The enum converts into the `String`/`&str` forms the builder and runtime
/// accept, and `ALL` lists the variants in declaration order.
///
/// # Example
///
/// ```
/// use sluice::builder::{state, ChartBuilder};
/// use sluice::state_enum;
///
/// state_enum! {
///     pub enum Light {
///         Red,
///         Green,
///         Yellow,
///     }
/// }
///
/// let chart = ChartBuilder::new("Light")
///     .states(Light::ALL.iter().copied())
///     .declare(state(Light::Red).edges([state(Light::Green).edges([
///         state(Light::Yellow).edges([state(Light::Red).elsewhere()]),
///     ])]))
///     .build()
///     .unwrap();
///
/// assert_eq!(chart.initial().name(), Light::Red.name());
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.name()
            }
        }

        impl ::std::convert::From<$name> for ::std::string::String {
            fn from(state: $name) -> ::std::string::String {
                state.name().to_string()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

/// Build [`Args`](crate::Args) from `name = value` pairs.
///
/// # Example
///
/// ```
/// use sluice::args;
///
/// let args = args!(sometimes = true, whatever = "once");
/// assert_eq!(args.get_as::<bool>("sometimes"), Some(true));
/// assert!(args!().is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($name:ident = $value:expr),+ $(,)?) => {{
        let mut args = $crate::Args::new();
        $(
            args.insert(stringify!($name), $value);
        )+
        args
    }};
}
