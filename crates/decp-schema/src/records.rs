//! Typed views of validated DECP records.
//!
//! Field names mirror the feed (camelCase on the wire). These types are only
//! deserialized after schema validation succeeded; they encode shape, not
//! constraints.

use chrono::NaiveDate;
use serde::Deserialize;

use decp_core::enums::{
    Ccag, ConcessionNature, ConcessionProcedure, ContractNature, ContractProcedure,
    EnvironmentalConsideration, ExecutionMode, IdentifierKind, OperatorGrouping, PlaceKind,
    PriceForm, PriceType, PriceVariation, PurchaseTechnique, SocialConsideration,
};

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Buyer or granting authority, always identified by SIRET.
#[derive(Debug, Clone, Deserialize)]
pub struct SiretHolder {
    pub id: String,
}

/// Seller-side organization with an explicit identifier registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub type_identifiant: IdentifierKind,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitulaireItem {
    pub titulaire: Party,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialConsiderations {
    #[serde(default)]
    pub consideration_sociale: Vec<SocialConsideration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalConsiderations {
    #[serde(default)]
    pub consideration_environnementale: Vec<EnvironmentalConsideration>,
}

// ---------------------------------------------------------------------------
// Contract awards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Techniques {
    #[serde(default)]
    pub technique: Vec<PurchaseTechnique>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionModes {
    #[serde(default)]
    pub modalite_execution: Vec<ExecutionMode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTypes {
    #[serde(default)]
    pub type_prix: Vec<PriceType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LieuExecution {
    pub code: String,
    pub type_code: PlaceKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActeSousTraitance {
    pub id: i64,
    pub sous_traitant: Party,
    pub duree_mois: i64,
    pub date_notification: NaiveDate,
    pub date_publication_donnees: NaiveDate,
    pub montant: f64,
    pub variation_prix: PriceVariation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActeSousTraitanceItem {
    pub acte_sous_traitance: ActeSousTraitance,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationActeSousTraitance {
    /// Sequence id of the amended act within the same contract.
    pub id: i64,
    pub duree_mois: Option<i64>,
    pub date_notification_modification_sous_traitance: NaiveDate,
    pub montant: Option<f64>,
    pub date_publication_donnees: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationActeSousTraitanceItem {
    pub modification_acte_sous_traitance: ModificationActeSousTraitance,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationMarche {
    pub id: i64,
    pub date_notification_modification: NaiveDate,
    pub date_publication_donnees_modification: NaiveDate,
    pub duree_mois: Option<i64>,
    pub montant: Option<f64>,
    pub titulaires: Option<Vec<TitulaireItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModificationMarcheItem {
    pub modification: ModificationMarche,
}

/// A contract award record, in either format.
///
/// The fields that only the current format makes mandatory are optional here;
/// the schema has already enforced them where they apply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarcheRecord {
    pub id: String,
    pub acheteur: SiretHolder,
    pub nature: ContractNature,
    pub objet: String,
    #[serde(rename = "codeCPV")]
    pub code_cpv: String,
    pub techniques: Techniques,
    pub modalites_execution: ExecutionModes,
    pub id_accord_cadre: Option<String>,
    pub taux_avance: Option<f64>,
    #[serde(default)]
    pub actes_sous_traitance: Vec<ActeSousTraitanceItem>,
    pub lieu_execution: LieuExecution,
    pub duree_mois: i64,
    pub date_notification: NaiveDate,
    pub date_publication_donnees: NaiveDate,
    pub montant: f64,
    pub types_prix: PriceTypes,
    #[serde(rename = "origineUE")]
    pub origine_ue: Option<f64>,
    pub origine_france: Option<f64>,
    pub titulaires: Vec<TitulaireItem>,
    pub considerations_sociales: SocialConsiderations,
    pub considerations_environnementales: EnvironmentalConsiderations,
    #[serde(default)]
    pub modifications_actes_sous_traitance: Vec<ModificationActeSousTraitanceItem>,
    #[serde(default)]
    pub modifications: Vec<ModificationMarcheItem>,
    pub marche_innovant: Option<bool>,
    pub ccag: Option<Ccag>,
    pub offres_recues: Option<i64>,
    pub attribution_avance: Option<bool>,
    pub type_groupement_operateurs: Option<OperatorGrouping>,
    pub sous_traitance_declaree: Option<bool>,
    pub procedure: Option<ContractProcedure>,
    pub forme_prix: Option<PriceForm>,
}

// ---------------------------------------------------------------------------
// Concessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tarif {
    pub intitule_tarif: String,
    pub tarif: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TarifItem {
    pub tarif: Tarif,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonneesAnnuelles {
    pub date_publication_donnees_execution: NaiveDate,
    pub depenses_investissement: f64,
    pub tarifs: Vec<TarifItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonneesExecutionItem {
    pub donnees_annuelles: DonneesAnnuelles,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConcessionnaireItem {
    pub concessionnaire: Party,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationConcession {
    pub id: i64,
    pub date_signature_modification: NaiveDate,
    pub date_publication_donnees_modification: NaiveDate,
    pub duree_mois: Option<i64>,
    pub valeur_globale: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModificationConcessionItem {
    pub modification: ModificationConcession,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcessionRecord {
    pub id: String,
    pub autorite_concedante: SiretHolder,
    pub nature: ConcessionNature,
    pub objet: String,
    pub procedure: ConcessionProcedure,
    pub duree_mois: i64,
    pub date_signature: NaiveDate,
    pub date_publication_donnees: NaiveDate,
    pub date_debut_execution: NaiveDate,
    pub valeur_globale: f64,
    pub montant_subvention_publique: f64,
    #[serde(default)]
    pub donnees_execution: Vec<DonneesExecutionItem>,
    pub concessionnaires: Vec<ConcessionnaireItem>,
    pub considerations_sociales: SocialConsiderations,
    pub considerations_environnementales: EnvironmentalConsiderations,
    #[serde(default)]
    pub modifications: Vec<ModificationConcessionItem>,
}
