//! JSON Schema documents for raw DECP records.
//!
//! Contract awards come in two variants. Records notified in 2024 or later
//! follow the current format, where procedure, CCAG, price form, offers
//! received and the declarative booleans are mandatory. Older records follow
//! the lenient format where those fields may be null or absent.
//!
//! Enum vocabularies are read from the `decp-core` code tables.

use serde_json::{Value, json};

use decp_core::enums::{
    Ccag, ConcessionNature, ConcessionProcedure, ContractNature, ContractProcedure,
    EnvironmentalConsideration, ExecutionMode, IdentifierKind, OperatorGrouping, PlaceKind,
    PriceForm, PriceType, PriceVariation, PurchaseTechnique, SocialConsideration,
};

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// ISO calendar date on or after 2000-01-01.
pub const DATE_PATTERN: &str = r"^2[0-9]{3}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$";

/// 14-digit SIRET.
pub const SIRET_PATTERN: &str = r"^[0-9]{14}$";

/// 8-digit CPV code with an optional check digit.
pub const CPV_PATTERN: &str = r"^[0-9]{8}(-[0-9])?$";

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

fn date() -> Value {
    json!({ "type": "string", "pattern": DATE_PATTERN })
}

fn string_max(max: u64) -> Value {
    json!({ "type": "string", "maxLength": max })
}

fn record_id() -> Value {
    json!({ "type": "string", "minLength": 1, "maxLength": 16 })
}

fn integer_min(min: i64) -> Value {
    json!({ "type": "integer", "minimum": min })
}

fn number_min(min: i64) -> Value {
    json!({ "type": "number", "minimum": min })
}

fn ratio() -> Value {
    json!({ "type": ["number", "null"], "minimum": 0, "maximum": 1 })
}

fn labels(values: Vec<&'static str>) -> Value {
    json!({ "enum": values })
}

/// Allow `null` on top of whatever `schema` accepts.
fn nullable(mut schema: Value) -> Value {
    if let Some(obj) = schema.as_object_mut() {
        if let Some(Value::Array(options)) = obj.get_mut("enum") {
            options.push(Value::Null);
        } else if let Some(ty) = obj.get("type").cloned() {
            let mut types = match ty {
                Value::Array(types) => types,
                other => vec![other],
            };
            types.push(json!("null"));
            obj.insert("type".into(), Value::Array(types));
        }
    }
    schema
}

fn object(properties: &Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// `{"<key>": [item, ...]}`, the inner key may be missing.
fn tagged_list(key: &str, item: &Value) -> Value {
    json!({
        "type": "object",
        "properties": { key: { "type": "array", "items": item } },
    })
}

/// `[{"<key>": item}, ...]`
fn wrapped_list(key: &str, item: &Value) -> Value {
    json!({
        "type": "array",
        "items": object(&json!({ key: item }), &[key]),
    })
}

fn siret_holder() -> Value {
    object(
        &json!({ "id": { "type": "string", "pattern": SIRET_PATTERN } }),
        &["id"],
    )
}

fn party() -> Value {
    object(
        &json!({
            "typeIdentifiant": labels(IdentifierKind::labels()),
            "id": { "type": "string" },
        }),
        &["typeIdentifiant", "id"],
    )
}

fn social_considerations() -> Value {
    tagged_list("considerationSociale", &labels(SocialConsideration::labels()))
}

fn environmental_considerations() -> Value {
    tagged_list(
        "considerationEnvironnementale",
        &labels(EnvironmentalConsideration::labels()),
    )
}

// ---------------------------------------------------------------------------
// Contract awards
// ---------------------------------------------------------------------------

fn contract_amendment() -> Value {
    object(
        &json!({
            "id": integer_min(1),
            "dateNotificationModification": date(),
            "datePublicationDonneesModification": date(),
            "dureeMois": nullable(integer_min(1)),
            "montant": nullable(number_min(1)),
            "titulaires": nullable(wrapped_list("titulaire", &party())),
        }),
        &[
            "id",
            "dateNotificationModification",
            "datePublicationDonneesModification",
        ],
    )
}

fn subcontracting_act() -> Value {
    object(
        &json!({
            "id": integer_min(1),
            "sousTraitant": party(),
            "dureeMois": integer_min(1),
            "dateNotification": date(),
            "datePublicationDonnees": date(),
            "montant": number_min(1),
            "variationPrix": labels(PriceVariation::labels()),
        }),
        &[
            "id",
            "sousTraitant",
            "dureeMois",
            "dateNotification",
            "datePublicationDonnees",
            "montant",
            "variationPrix",
        ],
    )
}

fn subcontracting_amendment() -> Value {
    object(
        &json!({
            "id": integer_min(1),
            "dureeMois": nullable(integer_min(1)),
            "dateNotificationModificationSousTraitance": date(),
            "montant": nullable(number_min(1)),
            "datePublicationDonnees": date(),
        }),
        &[
            "id",
            "dateNotificationModificationSousTraitance",
            "datePublicationDonnees",
        ],
    )
}

const MARCHE_REQUIRED: &[&str] = &[
    "id",
    "acheteur",
    "nature",
    "objet",
    "codeCPV",
    "techniques",
    "modalitesExecution",
    "lieuExecution",
    "dureeMois",
    "dateNotification",
    "datePublicationDonnees",
    "montant",
    "typesPrix",
    "titulaires",
    "considerationsSociales",
    "considerationsEnvironnementales",
];

/// Fields mandatory in the current format; the first four of them are
/// mandatory but nullable in the lenient one.
const DECLARATIVE_FIELDS: &[&str] = &[
    "marcheInnovant",
    "attributionAvance",
    "typeGroupementOperateurs",
    "sousTraitanceDeclaree",
];
const CURRENT_ONLY_FIELDS: &[&str] = &["ccag", "offresRecues", "procedure", "formePrix"];

/// Schema of a contract award record.
///
/// `current` selects the format for records notified from 2024 on.
#[must_use]
pub fn marche(current: bool) -> Value {
    let declarative = |schema: Value| if current { schema } else { nullable(schema) };

    let properties = json!({
        "id": record_id(),
        "acheteur": siret_holder(),
        "nature": labels(ContractNature::labels()),
        "objet": string_max(1_000),
        "codeCPV": { "type": "string", "pattern": CPV_PATTERN },
        "techniques": tagged_list("technique", &labels(PurchaseTechnique::labels())),
        "modalitesExecution": tagged_list("modaliteExecution", &labels(ExecutionMode::labels())),
        "idAccordCadre": { "type": ["string", "null"] },
        "tauxAvance": ratio(),
        "actesSousTraitance": wrapped_list("acteSousTraitance", &subcontracting_act()),
        "lieuExecution": object(
            &json!({
                "code": { "type": "string" },
                "typeCode": labels(PlaceKind::labels()),
            }),
            &["code", "typeCode"],
        ),
        "dureeMois": integer_min(1),
        "dateNotification": date(),
        "datePublicationDonnees": date(),
        "montant": number_min(1),
        "typesPrix": tagged_list("typePrix", &labels(PriceType::labels())),
        "origineUE": ratio(),
        "origineFrance": ratio(),
        "titulaires": wrapped_list("titulaire", &party()),
        "considerationsSociales": social_considerations(),
        "considerationsEnvironnementales": environmental_considerations(),
        "modificationsActesSousTraitance": wrapped_list(
            "modificationActeSousTraitance",
            &subcontracting_amendment(),
        ),
        "modifications": wrapped_list("modification", &contract_amendment()),
        "marcheInnovant": declarative(json!({ "type": "boolean" })),
        "attributionAvance": declarative(json!({ "type": "boolean" })),
        "typeGroupementOperateurs": declarative(labels(OperatorGrouping::labels())),
        "sousTraitanceDeclaree": declarative(json!({ "type": "boolean" })),
        "ccag": declarative(labels(Ccag::labels())),
        "offresRecues": declarative(integer_min(1)),
        "procedure": declarative(labels(ContractProcedure::labels())),
        "formePrix": declarative(labels(PriceForm::labels())),
    });

    let mut required: Vec<&str> = MARCHE_REQUIRED.to_vec();
    required.extend_from_slice(DECLARATIVE_FIELDS);
    if current {
        required.extend_from_slice(CURRENT_ONLY_FIELDS);
    }

    let mut schema = object(&properties, &required);
    schema["$schema"] = json!(DRAFT);
    schema["title"] = json!(if current { "Marché" } else { "Marché (avant 2024)" });
    schema
}

// ---------------------------------------------------------------------------
// Concessions
// ---------------------------------------------------------------------------

fn concession_amendment() -> Value {
    object(
        &json!({
            "id": integer_min(0),
            "dateSignatureModification": date(),
            "datePublicationDonneesModification": date(),
            "dureeMois": nullable(integer_min(1)),
            "valeurGlobale": nullable(number_min(0)),
        }),
        &[
            "id",
            "dateSignatureModification",
            "datePublicationDonneesModification",
        ],
    )
}

fn execution_data() -> Value {
    object(
        &json!({
            "datePublicationDonneesExecution": date(),
            "depensesInvestissement": number_min(0),
            "tarifs": wrapped_list(
                "tarif",
                &object(
                    &json!({
                        "intituleTarif": string_max(256),
                        "tarif": number_min(0),
                    }),
                    &["intituleTarif", "tarif"],
                ),
            ),
        }),
        &[
            "datePublicationDonneesExecution",
            "depensesInvestissement",
            "tarifs",
        ],
    )
}

/// Schema of a concession record.
#[must_use]
pub fn concession() -> Value {
    let properties = json!({
        "id": record_id(),
        "autoriteConcedante": siret_holder(),
        "nature": labels(ConcessionNature::labels()),
        "objet": string_max(1_000),
        "procedure": labels(ConcessionProcedure::labels()),
        "dureeMois": integer_min(1),
        "dateSignature": date(),
        "datePublicationDonnees": date(),
        "dateDebutExecution": date(),
        "valeurGlobale": number_min(1),
        "montantSubventionPublique": number_min(0),
        "donneesExecution": wrapped_list("donneesAnnuelles", &execution_data()),
        "concessionnaires": wrapped_list("concessionnaire", &party()),
        "considerationsSociales": social_considerations(),
        "considerationsEnvironnementales": environmental_considerations(),
        "modifications": wrapped_list("modification", &concession_amendment()),
    });

    let mut schema = object(
        &properties,
        &[
            "id",
            "autoriteConcedante",
            "nature",
            "objet",
            "procedure",
            "dureeMois",
            "dateSignature",
            "datePublicationDonnees",
            "dateDebutExecution",
            "valeurGlobale",
            "montantSubventionPublique",
            "concessionnaires",
            "considerationsSociales",
            "considerationsEnvironnementales",
        ],
    );
    schema["$schema"] = json!(DRAFT);
    schema["title"] = json!("Contrat de concession");
    schema
}
