//! Cafe enum types and parsers.
//!
//! Each enum stores as its `SCREAMING_SNAKE_CASE` name in the database and on
//! the wire, so `as_str` and `FromStr` are exact inverses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Parse error for the cafe enums in this module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {input}")]
pub struct ParseCafeEnumError {
    /// Name of the enum that failed to parse.
    pub kind: &'static str,
    /// Rejected input.
    pub input: String,
}

macro_rules! storage_enum {
    (
        $(#[$outer:meta])*
        $name:ident as $kind:literal {
            $( $(#[$variant_meta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $( $(#[$variant_meta])* $variant, )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$( Self::$variant, )+];

            /// Stable storage representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseCafeEnumError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(ParseCafeEnumError {
                        kind: $kind,
                        input: value.to_owned(),
                    }),
                }
            }
        }
    };
}

storage_enum! {
    /// Facilities a cafe can advertise.
    Amenity as "amenity" {
        /// Wireless internet access.
        Wifi => "WIFI",
        /// On-site parking.
        Parking => "PARKING",
        /// Tables outside.
        OutdoorSeating => "OUTDOOR_SEATING",
        /// Live music performances.
        LiveMusic => "LIVE_MUSIC",
        /// Pets are welcome.
        PetFriendly => "PET_FRIENDLY",
        /// Orders to take away.
        Takeaway => "TAKEAWAY",
        /// Delivery service.
        Delivery => "DELIVERY",
    }
}

storage_enum! {
    /// Day of the week used to key opening hours.
    DayOfWeek as "day of week" {
        /// Monday.
        Monday => "MONDAY",
        /// Tuesday.
        Tuesday => "TUESDAY",
        /// Wednesday.
        Wednesday => "WEDNESDAY",
        /// Thursday.
        Thursday => "THURSDAY",
        /// Friday.
        Friday => "FRIDAY",
        /// Saturday.
        Saturday => "SATURDAY",
        /// Sunday.
        Sunday => "SUNDAY",
    }
}

storage_enum! {
    /// Menu section a menu item belongs to.
    MenuCategory as "menu category" {
        /// Drinks.
        Beverage => "BEVERAGE",
        /// Main dishes.
        Food => "FOOD",
        /// Sweets.
        Dessert => "DESSERT",
        /// Small bites.
        Snack => "SNACK",
    }
}

#[cfg(test)]
mod tests {
    //! Parsing coverage for cafe enums.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn every_amenity_round_trips_through_storage_form() {
        for amenity in Amenity::ALL {
            assert_eq!(amenity.as_str().parse::<Amenity>(), Ok(*amenity));
        }
    }

    #[rstest]
    fn serde_uses_storage_form() {
        let value = serde_json::to_value(Amenity::PetFriendly).expect("serialise amenity");
        assert_eq!(value, serde_json::json!("PET_FRIENDLY"));
    }

    #[rstest]
    fn unknown_category_reports_kind() {
        let error = "BRUNCH".parse::<MenuCategory>().expect_err("unknown category");
        assert_eq!(error.to_string(), "invalid menu category: BRUNCH");
    }

    #[rstest]
    fn days_are_ordered_monday_first() {
        assert!(DayOfWeek::Monday < DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::ALL.len(), 7);
    }
}
