//! Code tables for the DECP procurement domain.
//!
//! Every table maps the human-readable label found in the feed to the compact
//! integer code persisted in the database. Labels serialize verbatim (they are
//! the feed's vocabulary), codes are what the store keeps. A few labels mean
//! "nothing applies" and have no persisted code; they are stored as absent.
//!
//! Codes are append-only: a new label gets the next free code, existing codes
//! never move.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;

/// Declares a closed label <-> code table.
///
/// Each entry is `Variant = ("label", Some(code))` or `Variant = ("label", None)`
/// for labels that are accepted on input but never persisted.
macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident = ($label:literal, $code:expr) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every entry of the table, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Table name used in decode errors.
            pub const TABLE: &'static str = stringify!($name);

            /// Feed label.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Persisted code, `None` for labels that are stored as absent.
            #[must_use]
            pub const fn code(self) -> Option<i64> {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            #[must_use]
            pub fn from_label(label: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str() == label)
            }

            /// Decode a persisted code.
            ///
            /// # Errors
            ///
            /// Returns `CoreError::UnknownCode` if no entry carries `code`.
            pub fn from_code(code: i64) -> Result<Self, CoreError> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.code() == Some(code))
                    .ok_or(CoreError::UnknownCode {
                        table: Self::TABLE,
                        code,
                    })
            }

            /// Every label of the table, for schema generation.
            #[must_use]
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

code_table! {
    /// Legal nature of a contract award.
    ContractNature {
        Contract = ("Marché", Some(1)),
        Partnership = ("Marché de partenariat", Some(2)),
        DefenceOrSecurity = ("Marché de défense ou de sécurité", Some(3)),
    }
}

code_table! {
    /// Award procedure of a contract.
    ContractProcedure {
        Adapted = ("Procédure adaptée", Some(1)),
        OpenTender = ("Appel d'offres ouvert", Some(2)),
        RestrictedTender = ("Appel d'offres restreint", Some(3)),
        WithoutNotice = ("Marché passé sans publicité ni mise en concurrence préalable", Some(4)),
        CompetitiveDialogue = ("Dialogue compétitif", Some(5)),
        Negotiated = ("Procédure avec négociation", Some(6)),
    }
}

code_table! {
    /// General administrative terms (CCAG) the contract refers to.
    Ccag {
        Works = ("Travaux", Some(1)),
        ProjectManagement = ("Maitrise d'œuvre", Some(2)),
        SuppliesAndServices = ("Fournitures courantes et services", Some(3)),
        Industrial = ("Marchés industriels", Some(4)),
        IntellectualServices = ("Prestations intellectuelles", Some(5)),
        InformationTechnology = ("Techniques de l'information et de la communication", Some(6)),
        NoCcag = ("Pas de CCAG", None),
    }
}

code_table! {
    /// How a group of sellers is bound together.
    OperatorGrouping {
        Joint = ("Conjoint", Some(1)),
        JointAndSeveral = ("Solidaire", Some(2)),
        NoGrouping = ("Pas de groupement", None),
    }
}

code_table! {
    PriceType {
        FirmFixed = ("Définitif ferme", Some(1)),
        Adjustable = ("Définitif actualisable", Some(2)),
        Revisable = ("Définitif révisable", Some(3)),
        Provisional = ("Provisoire", Some(4)),
    }
}

code_table! {
    PriceForm {
        Unit = ("Unitaire", Some(1)),
        Lump = ("Forfaitaire", Some(2)),
        Mixed = ("Mixte", Some(3)),
    }
}

code_table! {
    /// Price variation clause of a subcontracting act.
    PriceVariation {
        Firm = ("Ferme", Some(1)),
        Adjustable = ("Actualisable", Some(2)),
        Revisable = ("Révisable", Some(3)),
        NotDisclosed = ("NC", None),
    }
}

code_table! {
    PurchaseTechnique {
        FrameworkAgreement = ("Accord-cadre", Some(1)),
        DesignContest = ("Concours", Some(2)),
        QualificationSystem = ("Système de qualification", Some(3)),
        DynamicPurchasingSystem = ("Système d'acquisition dynamique", Some(4)),
        ElectronicCatalogue = ("Catalogue électronique", Some(5)),
        ElectronicAuction = ("Enchère électronique", Some(6)),
        NotApplicable = ("Sans objet", None),
    }
}

code_table! {
    ExecutionMode {
        Tranches = ("Tranches", Some(1)),
        PurchaseOrders = ("Bons de commande", Some(2)),
        SubsequentContracts = ("Marchés subséquents", Some(3)),
        NotApplicable = ("Sans objet", None),
    }
}

code_table! {
    /// Contract category derived from the CPV code.
    Category {
        Works = ("Travaux", Some(1)),
        Supplies = ("Fournitures", Some(2)),
        Services = ("Services", Some(3)),
    }
}

// ---------------------------------------------------------------------------
// Considerations (shared by contracts and concessions)
// ---------------------------------------------------------------------------

code_table! {
    SocialConsideration {
        Criterion = ("Critère social", Some(1)),
        Clause = ("Clause sociale", Some(2)),
        ReservedContract = ("Marché réservé", Some(3)),
        ReservedConcession = ("Concession réservé", Some(4)),
        NoConsideration = ("Pas de considération sociale", None),
    }
}

code_table! {
    EnvironmentalConsideration {
        Criterion = ("Critère environnemental", Some(1)),
        Clause = ("Clause environnementale", Some(2)),
        NoConsideration = ("Pas de considération environnementale", None),
    }
}

// ---------------------------------------------------------------------------
// Concession
// ---------------------------------------------------------------------------

code_table! {
    ConcessionNature {
        Works = ("Concession de travaux", Some(1)),
        Service = ("Concession de service", Some(2)),
        PublicService = ("Concession de service public", Some(3)),
        PublicServiceDelegation = ("Délégation de service public", Some(4)),
    }
}

code_table! {
    ConcessionProcedure {
        NegotiatedOpen = ("Procédure négociée ouverte", Some(1)),
        NonNegotiatedOpen = ("Procédure non négociée ouverte", Some(2)),
        NegotiatedRestricted = ("Procédure négociée restreinte", Some(3)),
        NonNegotiatedRestricted = ("Procédure non négociée restreinte", Some(4)),
    }
}

// ---------------------------------------------------------------------------
// Places
// ---------------------------------------------------------------------------

code_table! {
    /// Kind of location code an execution place is expressed in.
    PlaceKind {
        PostalCode = ("Code postal", Some(1)),
        Municipality = ("Code commune", Some(2)),
        District = ("Code arrondissement", Some(3)),
        Canton = ("Code canton", Some(4)),
        Department = ("Code département", Some(5)),
        Region = ("Code région", Some(6)),
        Country = ("Code pays", Some(7)),
    }
}

// ---------------------------------------------------------------------------
// IdentifierKind
// ---------------------------------------------------------------------------

/// Registry an organization identifier belongs to.
///
/// Persisted as its label, not as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum IdentifierKind {
    Siret,
    Tva,
    Tahiti,
    Ridet,
    Frwf,
    Irep,
    Ue,
    HorsUe,
}

impl IdentifierKind {
    pub const ALL: &'static [Self] = &[
        Self::Siret,
        Self::Tva,
        Self::Tahiti,
        Self::Ridet,
        Self::Frwf,
        Self::Irep,
        Self::Ue,
        Self::HorsUe,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Siret => "SIRET",
            Self::Tva => "TVA",
            Self::Tahiti => "TAHITI",
            Self::Ridet => "RIDET",
            Self::Frwf => "FRWF",
            Self::Irep => "IREP",
            Self::Ue => "UE",
            Self::HorsUe => "HORS-UE",
        }
    }

    /// Decode a persisted label.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownLabel` for anything outside the table.
    pub fn from_label(label: &str) -> Result<Self, CoreError> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == label)
            .ok_or_else(|| CoreError::UnknownLabel {
                table: "IdentifierKind",
                label: label.to_string(),
            })
    }

    #[must_use]
    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.as_str()).collect()
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RecordKind
// ---------------------------------------------------------------------------

/// The two kinds of record carried by a DECP document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Contract award ("marché").
    Marche,
    /// Concession contract.
    Concession,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marche => "marche",
            Self::Concession => "concession",
        }
    }

    /// Dotted path of the record array inside a DECP document.
    #[must_use]
    pub const fn item_path(self) -> &'static str {
        match self {
            Self::Marche => "marches.marche",
            Self::Concession => "marches.contrat-concession",
        }
    }

    /// Raw field naming the buyer-side organization of a record.
    #[must_use]
    pub const fn buyer_field(self) -> &'static str {
        match self {
            Self::Marche => "acheteur",
            Self::Concession => "autoriteConcedante",
        }
    }

    /// Raw field dating the record.
    #[must_use]
    pub const fn date_field(self) -> &'static str {
        match self {
            Self::Marche => "dateNotification",
            Self::Concession => "dateSignature",
        }
    }

    /// Decode a persisted label.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownLabel` for anything but `marche`/`concession`.
    pub fn from_label(label: &str) -> Result<Self, CoreError> {
        match label {
            "marche" => Ok(Self::Marche),
            "concession" => Ok(Self::Concession),
            other => Err(CoreError::UnknownLabel {
                table: "RecordKind",
                label: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
