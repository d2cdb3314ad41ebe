use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Role {
    Admin => "admin",
    Medecin => "medecin",
    Infirmiere => "infirmiere",
    Patient => "patient",
});

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(BloodType {
    APositive => "A+",
    ANegative => "A-",
    BPositive => "B+",
    BNegative => "B-",
    AbPositive => "AB+",
    AbNegative => "AB-",
    OPositive => "O+",
    ONegative => "O-",
});

// Legacy `hospitalizations.status`.
str_enum!(HospitalizationStatus {
    Active => "active",
    Discharged => "discharged",
    Planned => "planned",
});

// Current `hospitalisations.statut`.
str_enum!(HospitalisationStatut {
    Planifiee => "planifiee",
    EnCours => "en_cours",
    Terminee => "terminee",
    Annulee => "annulee",
});

str_enum!(SoinStatus {
    Scheduled => "scheduled",
    InProgress => "in_progress",
    Done => "done",
    Missed => "missed",
});

str_enum!(AppointmentStatus {
    Booked => "booked",
    Cancelled => "cancelled",
    Completed => "completed",
});

str_enum!(NotificationType {
    InApp => "in_app",
    Email => "email",
    Push => "push",
});

impl SoinStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scheduled => "Planifié",
            Self::InProgress => "En cours",
            Self::Done => "Terminé",
            Self::Missed => "Manqué",
        }
    }
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Booked => "Réservé",
            Self::Cancelled => "Annulé",
            Self::Completed => "Terminé",
        }
    }
}
