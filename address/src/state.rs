use std::{fmt, str::FromStr};

use anyhow::bail;

macro_rules! states {
    ($($code:ident => $name:literal,)*) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum State {
            $($code,)*
        }

        impl State {
            pub fn all() -> &'static [State] {
                &[$(Self::$code,)*]
            }

            /// Two-letter postal code, uppercase.
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$code => stringify!($code),)*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$code => $name,)*
                }
            }
        }
    };
}

states! {
    AL => "Alabama",
    AK => "Alaska",
    AZ => "Arizona",
    AR => "Arkansas",
    CA => "California",
    CO => "Colorado",
    CT => "Connecticut",
    DE => "Delaware",
    FL => "Florida",
    GA => "Georgia",
    HI => "Hawaii",
    ID => "Idaho",
    IL => "Illinois",
    IN => "Indiana",
    IA => "Iowa",
    KS => "Kansas",
    KY => "Kentucky",
    LA => "Louisiana",
    ME => "Maine",
    MD => "Maryland",
    MA => "Massachusetts",
    MI => "Michigan",
    MN => "Minnesota",
    MS => "Mississippi",
    MO => "Missouri",
    MT => "Montana",
    NE => "Nebraska",
    NV => "Nevada",
    NH => "New Hampshire",
    NJ => "New Jersey",
    NM => "New Mexico",
    NY => "New York",
    NC => "North Carolina",
    ND => "North Dakota",
    OH => "Ohio",
    OK => "Oklahoma",
    OR => "Oregon",
    PA => "Pennsylvania",
    RI => "Rhode Island",
    SC => "South Carolina",
    SD => "South Dakota",
    TN => "Tennessee",
    TX => "Texas",
    UT => "Utah",
    VT => "Vermont",
    VA => "Virginia",
    WA => "Washington",
    WV => "West Virginia",
    WI => "Wisconsin",
    WY => "Wyoming",
}

impl State {
    /// Looks up a state by its full name, e.g. "New Mexico". Exact match only.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|x| x.name() == name.trim())
    }
}

impl FromStr for State {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        match Self::all().iter().find(|x| x.code() == code) {
            Some(x) => Ok(*x),
            None => bail!("Unknown state code: {s}"),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
