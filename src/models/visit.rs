// src/models/visit.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::{value::StrDeserializer, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::customer::{Customer, ShopType};

// Atribui cada campo presente no patch (last-write-wins)
macro_rules! merge {
    ($target:ident; $($field:ident),* $(,)?) => {
        $(
            if let Some(value) = $field {
                $target.$field = value;
            }
        )*
    };
}

// --- ENUMS ---

// Mapeia o CREATE TYPE commercial_outcome do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "commercial_outcome", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommercialOutcome {
    NewOrder,
    OrderCommitment,
    PriceNegotiation,
    ComplaintResolved,
    InformationOnly,
    NoOutcome,
}

impl CommercialOutcome {
    /// Peso do resultado comercial na pontuação da visita.
    pub fn weight(self) -> f64 {
        match self {
            CommercialOutcome::NewOrder => 25.0,
            CommercialOutcome::OrderCommitment => 20.0,
            CommercialOutcome::PriceNegotiation => 15.0,
            CommercialOutcome::ComplaintResolved => 10.0,
            CommercialOutcome::InformationOnly => 5.0,
            CommercialOutcome::NoOutcome => 0.0,
        }
    }
}

// Prioridade de follow-up: quanto menor a pontuação, maior a prioridade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "priority_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
}

// O formulário manda "" para selects ainda não escolhidos
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => {
            let de: StrDeserializer<'_, D::Error> = value.into_deserializer();
            T::deserialize(de).map(Some)
        }
    }
}

// --- VENDAS E COMPRAS (guardado como JSONB) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BrandShare {
    pub name: String,
    pub percentage: f64,
}

fn complement(value: f64) -> f64 {
    100.0 - value
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SalesBreakdown {
    pub organic_percentage: Option<f64>,
    pub mineral_percentage: Option<f64>,

    pub liquids_percentage: Option<f64>,
    pub substrates_percentage: Option<f64>,

    pub german_purchase_percentage: Option<f64>,
    pub european_purchase_percentage: Option<f64>,

    pub liquid_brands: Vec<BrandShare>,
    pub substrate_brands: Vec<BrandShare>,
    pub german_distributors: Vec<BrandShare>,

    pub liquids_trend: Option<String>,
    pub liquids_trend_percentage: Option<f64>,
    pub substrates_trend: Option<String>,
    pub substrates_trend_percentage: Option<f64>,

    pub shop_presentation: Option<String>,
    pub total_employees: Option<i32>,
    pub estimated_canna_value: Option<f64>,
}

impl SalesBreakdown {
    /// Recalcula o segundo valor de cada par a partir do primeiro.
    /// Sem clamp: 120 vira -20.
    pub fn normalize_pairs(&mut self) {
        self.mineral_percentage = self.organic_percentage.map(complement);
        self.substrates_percentage = self.liquids_percentage.map(complement);
        self.european_purchase_percentage = self.german_purchase_percentage.map(complement);
    }

    pub fn apply(&mut self, patch: SalesPatch) {
        let SalesPatch {
            organic_percentage,
            liquids_percentage,
            german_purchase_percentage,
            liquid_brands,
            substrate_brands,
            german_distributors,
            liquids_trend,
            liquids_trend_percentage,
            substrates_trend,
            substrates_trend_percentage,
            shop_presentation,
            total_employees,
            estimated_canna_value,
        } = patch;

        merge!(self;
            organic_percentage,
            liquids_percentage,
            german_purchase_percentage,
            liquid_brands,
            substrate_brands,
            german_distributors,
            liquids_trend,
            liquids_trend_percentage,
            substrates_trend,
            substrates_trend_percentage,
            shop_presentation,
            total_employees,
            estimated_canna_value,
        );

        self.normalize_pairs();
    }
}

/// Edição parcial dos dados de vendas. Os complementos (mineral, substratos,
/// compra europeia) não aparecem aqui: são sempre derivados.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesPatch {
    pub organic_percentage: Option<Option<f64>>,
    pub liquids_percentage: Option<Option<f64>>,
    pub german_purchase_percentage: Option<Option<f64>>,
    pub liquid_brands: Option<Vec<BrandShare>>,
    pub substrate_brands: Option<Vec<BrandShare>>,
    pub german_distributors: Option<Vec<BrandShare>>,
    pub liquids_trend: Option<Option<String>>,
    pub liquids_trend_percentage: Option<Option<f64>>,
    pub substrates_trend: Option<Option<String>>,
    pub substrates_trend_percentage: Option<Option<f64>>,
    pub shop_presentation: Option<Option<String>>,
    pub total_employees: Option<Option<i32>>,
    pub estimated_canna_value: Option<Option<f64>>,
}

// --- RASCUNHO (O formulário em edição) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate, ToSchema)]
#[serde(default)]
pub struct VisitDraft {
    pub customer_id: Option<Uuid>,

    // Snapshot da loja (copiado do cliente na seleção)
    #[schema(example = "Acme Grow")]
    pub shop_name: String,
    #[serde(deserialize_with = "empty_as_none")]
    pub shop_type: Option<ShopType>,
    pub shop_address: String,
    pub zipcode: String,
    pub city: String,
    pub county: String,

    // Snapshot do contato
    pub contact_person: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub job_title: String,
    #[schema(value_type = Option<Object>)]
    pub gps_coordinates: Option<Value>,

    #[schema(value_type = Option<String>, format = Date, example = "2024-01-01")]
    pub visit_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Visit duration cannot be negative"))]
    pub visit_duration: i32,
    #[schema(example = "routine_check")]
    pub visit_purpose: String,

    #[validate(range(min = 0, max = 100, message = "Visibility score must be between 0 and 100"))]
    pub product_visibility_score: i32,
    pub products_discussed: Vec<String>,
    pub competitor_presence: String,

    pub training_provided: bool,
    pub training_topics: Vec<String>,
    pub support_materials_required: bool,
    pub support_materials_items: Vec<String>,
    pub support_materials_other_text: String,

    #[sqlx(json)]
    pub sales_data: SalesBreakdown,

    #[serde(deserialize_with = "empty_as_none")]
    pub commercial_outcome: Option<CommercialOutcome>,
    #[schema(value_type = f64)]
    pub order_value: Decimal,
    #[validate(range(min = 1, max = 10, message = "Satisfaction must be between 1 and 10"))]
    pub overall_satisfaction: i32,

    pub follow_up_required: bool,
    pub follow_up_notes: String,
    pub notes: String,
    pub visit_photos: Vec<String>,

    // Assinatura (imagem em data URL)
    pub signature: Option<String>,
    pub signature_signer_name: Option<String>,
    pub signature_date: Option<DateTime<Utc>>,
}

impl Default for VisitDraft {
    // Mesmos valores iniciais do formulário de nova visita
    fn default() -> Self {
        Self {
            customer_id: None,
            shop_name: String::new(),
            shop_type: None,
            shop_address: String::new(),
            zipcode: String::new(),
            city: String::new(),
            county: String::new(),
            contact_person: String::new(),
            contact_phone: String::new(),
            contact_email: String::new(),
            job_title: String::new(),
            gps_coordinates: None,
            visit_date: Some(Utc::now().date_naive()),
            visit_duration: 60,
            visit_purpose: String::new(),
            product_visibility_score: 50,
            products_discussed: Vec::new(),
            competitor_presence: String::new(),
            training_provided: false,
            training_topics: Vec::new(),
            support_materials_required: false,
            support_materials_items: Vec::new(),
            support_materials_other_text: String::new(),
            sales_data: SalesBreakdown::default(),
            commercial_outcome: None,
            order_value: Decimal::ZERO,
            overall_satisfaction: 5,
            follow_up_required: false,
            follow_up_notes: String::new(),
            notes: String::new(),
            visit_photos: Vec::new(),
            signature: None,
            signature_signer_name: None,
            signature_date: None,
        }
    }
}

impl VisitDraft {
    /// Mescla um patch no rascunho. Aplicar o mesmo patch duas vezes
    /// resulta no mesmo estado.
    pub fn apply(&mut self, patch: DraftPatch) {
        let DraftPatch {
            customer_id,
            shop_name,
            shop_type,
            shop_address,
            zipcode,
            city,
            county,
            contact_person,
            contact_phone,
            contact_email,
            job_title,
            gps_coordinates,
            visit_date,
            visit_duration,
            visit_purpose,
            product_visibility_score,
            products_discussed,
            competitor_presence,
            training_provided,
            training_topics,
            support_materials_required,
            support_materials_items,
            support_materials_other_text,
            sales,
            commercial_outcome,
            order_value,
            overall_satisfaction,
            follow_up_required,
            follow_up_notes,
            notes,
            visit_photos,
            signature,
            signature_signer_name,
            signature_date,
        } = patch;

        merge!(self;
            customer_id,
            shop_name,
            shop_type,
            shop_address,
            zipcode,
            city,
            county,
            contact_person,
            contact_phone,
            contact_email,
            job_title,
            gps_coordinates,
            visit_date,
            visit_duration,
            visit_purpose,
            product_visibility_score,
            products_discussed,
            competitor_presence,
            training_provided,
            training_topics,
            support_materials_required,
            support_materials_items,
            support_materials_other_text,
            commercial_outcome,
            order_value,
            overall_satisfaction,
            follow_up_required,
            follow_up_notes,
            notes,
            visit_photos,
            signature,
            signature_signer_name,
            signature_date,
        );

        if let Some(sales) = sales {
            self.sales_data.apply(sales);
        }
    }

    /// Sobrepõe ao rascunho só as chaves enviadas; o resto continua como está.
    /// `sales_data` é substituído inteiro quando vier.
    pub fn merged_with(&self, fields: Map<String, Value>) -> Result<VisitDraft, serde_json::Error> {
        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        current.extend(fields);
        serde_json::from_value(Value::Object(current))
    }

    /// Copia os dados da loja e do contato do cliente selecionado.
    pub fn apply_customer(&mut self, customer: &Customer) {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        self.customer_id = Some(customer.id);
        self.shop_name = customer.shop_name.clone();
        self.shop_type = Some(customer.shop_type);
        self.shop_address = text(&customer.shop_address);
        self.zipcode = text(&customer.zipcode);
        self.city = text(&customer.city);
        self.county = text(&customer.county);
        self.contact_person = text(&customer.contact_person);
        self.contact_phone = text(&customer.contact_phone);
        self.contact_email = text(&customer.contact_email);
        self.job_title = text(&customer.job_title);
        self.gps_coordinates = customer.gps_coordinates.clone();
    }
}

/// Conjunto parcial de atribuições vindas do formulário.
/// `None` = campo não tocado; para campos opcionais, `Some(None)` limpa o valor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    pub customer_id: Option<Option<Uuid>>,
    pub shop_name: Option<String>,
    pub shop_type: Option<Option<ShopType>>,
    pub shop_address: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub job_title: Option<String>,
    pub gps_coordinates: Option<Option<Value>>,
    pub visit_date: Option<Option<NaiveDate>>,
    pub visit_duration: Option<i32>,
    pub visit_purpose: Option<String>,
    pub product_visibility_score: Option<i32>,
    pub products_discussed: Option<Vec<String>>,
    pub competitor_presence: Option<String>,
    pub training_provided: Option<bool>,
    pub training_topics: Option<Vec<String>>,
    pub support_materials_required: Option<bool>,
    pub support_materials_items: Option<Vec<String>>,
    pub support_materials_other_text: Option<String>,
    pub sales: Option<SalesPatch>,
    pub commercial_outcome: Option<Option<CommercialOutcome>>,
    pub order_value: Option<Decimal>,
    pub overall_satisfaction: Option<i32>,
    pub follow_up_required: Option<bool>,
    pub follow_up_notes: Option<String>,
    pub notes: Option<String>,
    pub visit_photos: Option<Vec<String>>,
    pub signature: Option<Option<String>>,
    pub signature_signer_name: Option<Option<String>>,
    pub signature_date: Option<Option<DateTime<Utc>>>,
}

// --- PONTUAÇÃO ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ScoreCard {
    pub calculated_score: f64,
    pub priority_level: PriorityLevel,
}

/// O que é gravado no banco: rascunho sem pontuação, ou relatório final com ela.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    pub draft: VisitDraft,
    pub score: Option<ScoreCard>,
}

impl VisitRecord {
    pub fn draft(mut draft: VisitDraft) -> Self {
        draft.sales_data.normalize_pairs();
        Self { draft, score: None }
    }

    pub fn finalized(mut draft: VisitDraft, score: ScoreCard) -> Self {
        draft.sales_data.normalize_pairs();
        Self { draft, score: Some(score) }
    }

    pub fn is_draft(&self) -> bool {
        self.score.is_none()
    }
}

// --- VISITA PERSISTIDA ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: Uuid,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub draft: VisitDraft,

    pub is_draft: bool,
    pub calculated_score: Option<f64>,
    pub priority_level: Option<PriorityLevel>,
    pub draft_saved_at: Option<DateTime<Utc>>,

    // Nome atual do cliente (LEFT JOIN); o snapshot fica em `shop_name`
    #[sqlx(default)]
    pub customer_shop_name: Option<String>,

    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visit {
    pub fn score(&self) -> Option<ScoreCard> {
        match (self.calculated_score, self.priority_level) {
            (Some(calculated_score), Some(priority_level)) => Some(ScoreCard {
                calculated_score,
                priority_level,
            }),
            _ => None,
        }
    }
}

// Corpo de POST/PUT /visits
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveVisitPayload {
    #[serde(flatten)]
    pub draft: VisitDraft,

    // Sem a flag, a gravação é tratada como rascunho
    #[serde(default = "default_is_draft")]
    #[schema(example = true)]
    pub is_draft: bool,
}

// Corpo de PUT /visits/{id}: só as chaves presentes mudam
#[derive(Debug, Default, Deserialize)]
pub struct UpdateVisitPayload {
    // Ausente = mantém o estado atual do relatório
    pub is_draft: Option<bool>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn default_is_draft() -> bool {
    true
}

// --- FILTROS DE LISTAGEM (tela de relatórios) ---

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpFilter {
    #[default]
    All,
    Required,
    #[serde(alias = "none")]
    NotRequired,
}

impl FollowUpFilter {
    pub fn as_flag(self) -> Option<bool> {
        match self {
            FollowUpFilter::All => None,
            FollowUpFilter::Required => Some(true),
            FollowUpFilter::NotRequired => Some(false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitFilter {
    pub customer_id: Option<Uuid>,
    pub shop_type: Option<ShopType>,
    pub priority: Option<PriorityLevel>,
    pub follow_up: Option<FollowUpFilter>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub date_to: Option<NaiveDate>,
    pub is_draft: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl VisitFilter {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn organic_percentage_sets_mineral_complement() {
        let mut sales = SalesBreakdown::default();

        sales.apply(SalesPatch {
            organic_percentage: Some(Some(37.0)),
            ..Default::default()
        });
        assert_eq!(sales.mineral_percentage, Some(63.0));

        sales.apply(SalesPatch {
            organic_percentage: Some(Some(0.0)),
            ..Default::default()
        });
        assert_eq!(sales.mineral_percentage, Some(100.0));
    }

    #[test]
    fn percentages_above_hundred_pass_through_unclamped() {
        let mut sales = SalesBreakdown::default();
        sales.apply(SalesPatch {
            liquids_percentage: Some(Some(120.0)),
            german_purchase_percentage: Some(Some(40.0)),
            ..Default::default()
        });

        assert_eq!(sales.liquids_percentage, Some(120.0));
        assert_eq!(sales.substrates_percentage, Some(-20.0));
        assert_eq!(sales.european_purchase_percentage, Some(60.0));
    }

    #[test]
    fn stored_complement_is_recomputed_on_record_creation() {
        let mut draft = VisitDraft::default();
        draft.sales_data.organic_percentage = Some(30.0);
        draft.sales_data.mineral_percentage = Some(10.0);

        let record = VisitRecord::draft(draft);
        assert_eq!(record.draft.sales_data.mineral_percentage, Some(70.0));
        assert!(record.is_draft());
    }

    #[test]
    fn apply_is_idempotent() {
        let patch = DraftPatch {
            shop_name: Some("Acme Grow".into()),
            visit_photos: Some(vec!["https://cdn.example/1.jpg".into()]),
            commercial_outcome: Some(Some(CommercialOutcome::NewOrder)),
            sales: Some(SalesPatch {
                organic_percentage: Some(Some(45.0)),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mut once = VisitDraft::default();
        once.apply(patch.clone());

        let mut twice = once.clone();
        twice.apply(patch);

        assert_eq!(once, twice);
    }

    #[test]
    fn untouched_fields_are_kept() {
        let mut draft = VisitDraft {
            notes: "keep me".into(),
            ..Default::default()
        };
        draft.apply(DraftPatch {
            shop_name: Some("Acme Grow".into()),
            ..Default::default()
        });

        assert_eq!(draft.notes, "keep me");
        assert_eq!(draft.shop_name, "Acme Grow");
    }

    #[test]
    fn empty_select_values_deserialize_as_none() {
        let draft: VisitDraft = serde_json::from_value(json!({
            "shop_type": "",
            "commercial_outcome": "",
            "shop_name": "Acme Grow"
        }))
        .unwrap();

        assert_eq!(draft.shop_type, None);
        assert_eq!(draft.commercial_outcome, None);
        assert_eq!(draft.overall_satisfaction, 5);
    }

    #[test]
    fn save_payload_defaults_to_draft() {
        let payload: SaveVisitPayload = serde_json::from_value(json!({
            "shop_name": "Acme Grow",
            "shop_type": "growshop",
            "commercial_outcome": "information_only"
        }))
        .unwrap();

        assert!(payload.is_draft);
        assert_eq!(payload.draft.shop_type, Some(ShopType::Growshop));
        assert_eq!(
            payload.draft.commercial_outcome,
            Some(CommercialOutcome::InformationOnly)
        );
    }

    #[test]
    fn partial_update_keeps_fields_not_sent() {
        let stored = VisitDraft {
            customer_id: Some(Uuid::new_v4()),
            shop_name: "Acme Grow".into(),
            shop_type: Some(ShopType::Growshop),
            visit_date: NaiveDate::from_ymd_opt(2024, 3, 14),
            overall_satisfaction: 8,
            order_value: Decimal::new(12_550, 2),
            commercial_outcome: Some(CommercialOutcome::NewOrder),
            visit_photos: vec!["https://cdn.example/shelf.jpg".into()],
            signature: Some("data:image/png;base64,AAAA".into()),
            signature_signer_name: Some("Jane Doe".into()),
            ..Default::default()
        };

        let payload: UpdateVisitPayload = serde_json::from_value(json!({
            "customer_id": stored.customer_id,
            "notes": "only notes changed"
        }))
        .unwrap();
        assert_eq!(payload.is_draft, None);

        let merged = stored.merged_with(payload.fields).unwrap();

        assert_eq!(merged.notes, "only notes changed");
        assert_eq!(
            merged,
            VisitDraft {
                notes: "only notes changed".into(),
                ..stored
            }
        );
    }

    #[test]
    fn partial_update_can_clear_optional_fields() {
        let stored = VisitDraft {
            shop_type: Some(ShopType::Nursery),
            signature: Some("data:image/png;base64,AAAA".into()),
            ..Default::default()
        };

        let payload: UpdateVisitPayload = serde_json::from_value(json!({
            "is_draft": false,
            "shop_type": "",
            "signature": null
        }))
        .unwrap();
        assert_eq!(payload.is_draft, Some(false));

        let merged = stored.merged_with(payload.fields).unwrap();
        assert_eq!(merged.shop_type, None);
        assert_eq!(merged.signature, None);
    }

    #[test]
    fn partial_update_rejects_wrong_types() {
        let payload: UpdateVisitPayload =
            serde_json::from_value(json!({ "overall_satisfaction": "very" })).unwrap();
        assert!(VisitDraft::default().merged_with(payload.fields).is_err());
    }

    #[test]
    fn follow_up_filter_accepts_none_alias() {
        let filter: FollowUpFilter = serde_json::from_value(json!("none")).unwrap();
        assert_eq!(filter, FollowUpFilter::NotRequired);
        assert_eq!(filter.as_flag(), Some(false));
        assert_eq!(FollowUpFilter::All.as_flag(), None);
    }

    #[test]
    fn filter_limit_is_bounded() {
        let filter = VisitFilter {
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        };
        assert_eq!(filter.limit(), VisitFilter::MAX_LIMIT);
        assert_eq!(filter.offset(), 0);
        assert_eq!(VisitFilter::default().limit(), VisitFilter::DEFAULT_LIMIT);
    }
}
