//! Turns validated records into the persisted entity graph.
//!
//! Nothing is written here: contracts and concessions are staged, together
//! with whatever the resolver created, until the driver takes the batch.

use std::collections::HashMap;

use decp_core::categorisation::cpv_to_category;
use decp_core::entities::{
    Concession, ConcessionAmendment, Contract, ContractAmendment, ExecutionData, MalformedRecord,
    SubcontractingAct, SubcontractingAmendment, Tariff,
};
use decp_core::enums::{IdentifierKind, PurchaseTechnique};
use decp_schema::ValidationFailure;
use decp_schema::records::{ConcessionRecord, MarcheRecord, TitulaireItem};

use super::batch::PendingBatch;
use super::resolver::{EntityResolver, Role, UidSequence};
use crate::DecpDb;
use crate::error::DatabaseError;

/// Location reported when a subcontracting amendment targets an unknown act.
const ACT_AMENDMENTS_FIELD: &str = "modificationsActesSousTraitance";

pub struct RecordTransformer {
    pub(super) resolver: EntityResolver,
    contract_uids: UidSequence,
    concession_uids: UidSequence,
    pub(super) malformed_uids: UidSequence,
    contracts: Vec<Contract>,
    concessions: Vec<Concession>,
    pub(super) malformed: Vec<MalformedRecord>,
}

impl RecordTransformer {
    /// Build a transformer whose resolver and key sequences continue from
    /// the store's current content.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the preload queries fail.
    pub async fn preload(db: &DecpDb) -> Result<Self, DatabaseError> {
        let resolver = EntityResolver::preload(db).await?;
        let mut transformer = Self::new(resolver);
        transformer.contract_uids = UidSequence::after(db.max_uid("contracts").await?);
        transformer.concession_uids = UidSequence::after(db.max_uid("concessions").await?);
        transformer.malformed_uids = UidSequence::after(db.max_uid("malformed_records").await?);
        Ok(transformer)
    }

    /// Transformer over an existing resolver, record keys starting at 1.
    #[must_use]
    pub fn new(resolver: EntityResolver) -> Self {
        Self {
            resolver,
            contract_uids: UidSequence::default(),
            concession_uids: UidSequence::default(),
            malformed_uids: UidSequence::default(),
            contracts: Vec::new(),
            concessions: Vec::new(),
            malformed: Vec::new(),
        }
    }

    #[must_use]
    pub const fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    /// Contracts staged since the last batch was taken.
    #[must_use]
    pub fn staged_contracts(&self) -> &[Contract] {
        &self.contracts
    }

    #[must_use]
    pub fn staged_concessions(&self) -> &[Concession] {
        &self.concessions
    }

    #[must_use]
    pub fn staged_malformed(&self) -> &[MalformedRecord] {
        &self.malformed
    }

    /// Hand over everything staged since the last call.
    pub fn take_batch(&mut self) -> PendingBatch {
        let entities = self.resolver.take_pending();
        PendingBatch {
            new_organizations: entities.new_organizations,
            updated_organizations: entities.updated_organizations,
            new_places: entities.new_places,
            contracts: std::mem::take(&mut self.contracts),
            concessions: std::mem::take(&mut self.concessions),
            malformed: std::mem::take(&mut self.malformed),
        }
    }

    fn sellers(&mut self, titulaires: &[TitulaireItem]) -> Vec<i64> {
        titulaires
            .iter()
            .map(|t| {
                self.resolver.organization(
                    &t.titulaire.id,
                    t.titulaire.type_identifiant,
                    Some(Role::Seller),
                )
            })
            .collect()
    }

    /// Stage a contract award.
    ///
    /// Amounts and durations start at their initial values and are carried
    /// forward through the amendments in order. A contract using the
    /// framework-agreement technique becomes resolvable by later contracts
    /// once it is fully transformed.
    ///
    /// # Errors
    ///
    /// Returns an incoherence failure when a subcontracting amendment targets
    /// an act the contract does not declare. Nothing is staged for the
    /// contract then, though organizations resolved so far stay staged.
    pub fn transform_marche(&mut self, record: MarcheRecord) -> Result<(), ValidationFailure> {
        let buyer_uid =
            self.resolver
                .organization(&record.acheteur.id, IdentifierKind::Siret, Some(Role::Buyer));
        let category = cpv_to_category(&record.code_cpv);
        let place_uid = Some(
            self.resolver
                .place(&record.lieu_execution.code, record.lieu_execution.type_code),
        );
        let framework_uid = record
            .id_accord_cadre
            .as_deref()
            .and_then(|id| self.resolver.framework(id));
        let is_framework = record
            .techniques
            .technique
            .contains(&PurchaseTechnique::FrameworkAgreement);
        let seller_uids = self.sellers(&record.titulaires);

        let mut contract = Contract {
            uid: self.contract_uids.next(),
            id: record.id,
            buyer_uid,
            nature: record.nature,
            object: record.objet,
            cpv: record.code_cpv,
            category,
            framework_uid,
            innovative: record.marche_innovant.unwrap_or(false),
            ccag: record.ccag.filter(|c| c.code().is_some()),
            offers_received: record.offres_recues,
            advance_granted: record.attribution_avance.unwrap_or(false),
            advance_rate: record.taux_avance,
            operator_grouping: record.type_groupement_operateurs.filter(|g| g.code().is_some()),
            subcontracting_declared: record.sous_traitance_declaree.unwrap_or(false),
            procedure: record.procedure,
            place_uid,
            duration_months: record.duree_mois,
            initial_duration_months: record.duree_mois,
            notified_on: record.date_notification,
            published_on: record.date_publication_donnees,
            amount: record.montant,
            initial_amount: record.montant,
            price_form: record.forme_prix,
            eu_origin: record.origine_ue,
            france_origin: record.origine_france,
            price_types: record.types_prix.type_prix,
            execution_modes: record
                .modalites_execution
                .modalite_execution
                .into_iter()
                .filter(|m| m.code().is_some())
                .collect(),
            purchase_techniques: record
                .techniques
                .technique
                .into_iter()
                .filter(|t| t.code().is_some())
                .collect(),
            social_considerations: record
                .considerations_sociales
                .consideration_sociale
                .into_iter()
                .filter(|c| c.code().is_some())
                .collect(),
            environmental_considerations: record
                .considerations_environnementales
                .consideration_environnementale
                .into_iter()
                .filter(|c| c.code().is_some())
                .collect(),
            seller_uids,
            amendments: Vec::new(),
            subcontracting_acts: Vec::new(),
        };

        let mut acts_by_id: HashMap<i64, usize> = HashMap::new();
        for item in record.actes_sous_traitance {
            let act = item.acte_sous_traitance;
            let subcontractor_uid = self.resolver.organization(
                &act.sous_traitant.id,
                act.sous_traitant.type_identifiant,
                Some(Role::Seller),
            );
            acts_by_id.insert(act.id, contract.subcontracting_acts.len());
            contract.subcontracting_acts.push(SubcontractingAct {
                id: act.id,
                subcontractor_uid,
                duration_months: act.duree_mois,
                initial_duration_months: act.duree_mois,
                notified_on: act.date_notification,
                published_on: act.date_publication_donnees,
                amount: act.montant,
                initial_amount: act.montant,
                price_variation: Some(act.variation_prix).filter(|v| v.code().is_some()),
                amendments: Vec::new(),
            });
        }

        let mut act_amendments: Vec<_> = record
            .modifications_actes_sous_traitance
            .into_iter()
            .map(|item| item.modification_acte_sous_traitance)
            .collect();
        act_amendments.sort_by_key(|a| a.date_notification_modification_sous_traitance);
        for amendment in act_amendments {
            let Some(&index) = acts_by_id.get(&amendment.id) else {
                return Err(ValidationFailure::incoherence(
                    ACT_AMENDMENTS_FIELD,
                    &format!("subcontracting act {} does not exist", amendment.id),
                ));
            };
            let act = &mut contract.subcontracting_acts[index];
            act.amendments.push(SubcontractingAmendment {
                duration_months: amendment.duree_mois,
                amount: amendment.montant,
                notified_on: amendment.date_notification_modification_sous_traitance,
                published_on: amendment.date_publication_donnees,
            });
            if let Some(duration) = amendment.duree_mois {
                act.duration_months = duration;
            }
            if let Some(amount) = amendment.montant {
                act.amount = amount;
            }
        }

        let mut amendments: Vec<_> = record
            .modifications
            .into_iter()
            .map(|item| item.modification)
            .collect();
        amendments.sort_by_key(|m| m.id);
        for amendment in amendments {
            let seller_uids = amendment
                .titulaires
                .as_deref()
                .map(|t| self.sellers(t))
                .unwrap_or_default();
            if let Some(amount) = amendment.montant {
                contract.amount = amount;
            }
            if let Some(duration) = amendment.duree_mois {
                contract.duration_months = duration;
            }
            if !seller_uids.is_empty() {
                contract.seller_uids.clone_from(&seller_uids);
            }
            contract.amendments.push(ContractAmendment {
                id: amendment.id,
                duration_months: amendment.duree_mois,
                amount: amendment.montant,
                notified_on: amendment.date_notification_modification,
                published_on: amendment.date_publication_donnees_modification,
                seller_uids,
            });
        }

        if is_framework {
            self.resolver
                .register_framework(contract.id.clone(), contract.uid);
        }
        self.contracts.push(contract);
        Ok(())
    }

    /// Stage a concession.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches `transform_marche` so the
    /// driver treats both kinds alike.
    pub fn transform_concession(
        &mut self,
        record: ConcessionRecord,
    ) -> Result<(), ValidationFailure> {
        let authority_uid = self.resolver.organization(
            &record.autorite_concedante.id,
            IdentifierKind::Siret,
            Some(Role::Buyer),
        );

        let execution_data = record
            .donnees_execution
            .into_iter()
            .map(|item| {
                let data = item.donnees_annuelles;
                ExecutionData {
                    published_on: data.date_publication_donnees_execution,
                    investment_spending: data.depenses_investissement,
                    tariffs: data
                        .tarifs
                        .into_iter()
                        .map(|t| Tariff {
                            label: t.tarif.intitule_tarif,
                            amount: t.tarif.tarif,
                        })
                        .collect(),
                }
            })
            .collect();

        let concessionaire_uids = record
            .concessionnaires
            .iter()
            .map(|c| {
                self.resolver.organization(
                    &c.concessionnaire.id,
                    c.concessionnaire.type_identifiant,
                    Some(Role::Seller),
                )
            })
            .collect();

        let mut concession = Concession {
            uid: self.concession_uids.next(),
            id: record.id,
            authority_uid,
            nature: record.nature,
            object: record.objet,
            procedure: record.procedure,
            duration_months: record.duree_mois,
            initial_duration_months: record.duree_mois,
            signed_on: record.date_signature,
            published_on: record.date_publication_donnees,
            execution_starts_on: record.date_debut_execution,
            global_value: record.valeur_globale,
            initial_global_value: record.valeur_globale,
            public_subsidy: record.montant_subvention_publique,
            social_considerations: record
                .considerations_sociales
                .consideration_sociale
                .into_iter()
                .filter(|c| c.code().is_some())
                .collect(),
            environmental_considerations: record
                .considerations_environnementales
                .consideration_environnementale
                .into_iter()
                .filter(|c| c.code().is_some())
                .collect(),
            concessionaire_uids,
            amendments: Vec::new(),
            execution_data,
        };

        let mut amendments: Vec<_> = record
            .modifications
            .into_iter()
            .map(|item| item.modification)
            .collect();
        amendments.sort_by_key(|m| m.id);
        for amendment in amendments {
            if let Some(value) = amendment.valeur_globale {
                concession.global_value = value;
            }
            if let Some(duration) = amendment.duree_mois {
                concession.duration_months = duration;
            }
            concession.amendments.push(ConcessionAmendment {
                id: amendment.id,
                signed_on: amendment.date_signature_modification,
                published_on: amendment.date_publication_donnees_modification,
                duration_months: amendment.duree_mois,
                global_value: amendment.valeur_globale,
            });
        }

        self.concessions.push(concession);
        Ok(())
    }
}
