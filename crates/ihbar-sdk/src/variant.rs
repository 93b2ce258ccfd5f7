use solana_sdk::{hash::Hash, pubkey::Pubkey};

use crate::action::{
    ActionGetResponse, ActionLinks, ActionParameter, ActionPostResponse, ActionType,
    LinkedAction,
};
use crate::error::Result;
use crate::fields::{validate, FieldSpec};
use crate::memo::MemoTemplate;
use crate::transaction::{build_report_transaction, serialize_transaction};

pub const ACTIONS_PATH_PREFIX: &str = "/api/actions";

pub const BENIM_HAYATIM: &str = "benimHayatim";
pub const PLATFORM_IHBAR: &str = "platformIhbar";

pub const DEFAULT_BENIM_HAYATIM_RECIPIENT: &str = "6wbNVswVdbSAakfojVxY5DRLh3J5simMSajU2aoC4JUP";
pub const DEFAULT_PLATFORM_IHBAR_RECIPIENT: &str = "84ZK3ZGmotQmFUSRxiQe6qUA5eHFTHWWgBTwG6k18b78";

const ICON_URL: &str = "https://i.ibb.co/KsqNkXD/solmessage.png";
const SUCCESS_MESSAGE: &str = "İhbarınız başarıyla iletildi";

/// Declarative description of one report action. Both deployed endpoints are values of
/// this type driving the same pipeline.
#[derive(Clone, Debug)]
pub struct ActionVariant {
    /// Last path segment under [`ACTIONS_PATH_PREFIX`].
    pub name: String,
    pub recipient: Pubkey,
    pub title: String,
    pub icon: String,
    pub description: String,
    pub label: String,
    pub button_label: String,
    pub fields: Vec<FieldSpec>,
    pub memo: MemoTemplate,
    pub success_message: String,
}

impl ActionVariant {
    /// Two-field report: suspect and report text.
    pub fn benim_hayatim(recipient: Pubkey) -> Result<Self> {
        let fields = vec![
            FieldSpec::new("suclu", "sucluIsmi", "Suclu", "sucluIsmi"),
            FieldSpec::new("ihbar", "ihbarMetni", "Ihbar", "ihbar"),
        ];
        let memo = MemoTemplate::parse("Suclu: {suclu} | Ihbar: {ihbar}", &fields)?;

        Ok(Self {
            name: BENIM_HAYATIM.to_string(),
            recipient,
            title: "SEN DEGIL ONLAR UYUMASIN".to_string(),
            icon: ICON_URL.to_string(),
            description: "Tamamen Anonnim ve Gizli İhbarda Bulunun".to_string(),
            label: "Transfer".to_string(),
            button_label: "Tamamla".to_string(),
            fields,
            memo,
            success_message: SUCCESS_MESSAGE.to_string(),
        })
    }

    /// Four-field report: platform, suspect, time and report text.
    pub fn platform_ihbar(recipient: Pubkey) -> Result<Self> {
        let fields = vec![
            FieldSpec::new("platform", "platformAdi", "Platform", "platform"),
            FieldSpec::new("suclu", "sucluIsmi", "Suclu", "sucluIsmi"),
            FieldSpec::new("zaman", "zamanBilgisi", "Zaman", "zaman"),
            FieldSpec::new("ihbar", "ihbarMetni", "Ihbar", "ihbar"),
        ];
        let memo = MemoTemplate::parse(
            "Platform : {platform}| Suclu: {suclu} | Zaman: {zaman} | Ihbar: {ihbar}",
            &fields,
        )?;

        Ok(Self {
            name: PLATFORM_IHBAR.to_string(),
            recipient,
            title: "SEN DEGIL ONLAR UYUMASIN".to_string(),
            icon: ICON_URL.to_string(),
            description: "Gördüğünüz paylaşımı platform ve zaman bilgisiyle tamamen anonim ve gizli ihbar edin"
                .to_string(),
            label: "Transfer".to_string(),
            button_label: "Tamamla".to_string(),
            fields,
            memo,
            success_message: SUCCESS_MESSAGE.to_string(),
        })
    }

    pub fn path(&self) -> String {
        format!("{}/{}", ACTIONS_PATH_PREFIX, self.name)
    }

    /// Link template, e.g. `<base>/api/actions/benimHayatim?suclu={sucluIsmi}&ihbar={ihbarMetni}`.
    pub fn href(&self, base_url: &str) -> String {
        let query: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}={{{}}}", f.query_key, f.template_param))
            .collect();
        format!(
            "{}{}?{}",
            base_url.trim_end_matches('/'),
            self.path(),
            query.join("&")
        )
    }

    pub fn get_response(&self, base_url: &str) -> ActionGetResponse {
        let parameters = self
            .fields
            .iter()
            .map(|f| ActionParameter {
                name: f.template_param.clone(),
                label: f.label.clone(),
                required: true,
            })
            .collect();

        ActionGetResponse {
            kind: ActionType::Action,
            title: self.title.clone(),
            icon: self.icon.clone(),
            description: self.description.clone(),
            label: self.label.clone(),
            links: ActionLinks {
                actions: vec![LinkedAction {
                    label: self.button_label.clone(),
                    href: self.href(base_url),
                    parameters,
                }],
            },
        }
    }

    /// Validate the query parameters and render the plaintext memo.
    pub fn compose_memo(&self, params: &[(String, String)]) -> Result<String> {
        let values = validate(&self.fields, params)?;
        Ok(self.memo.render(&values))
    }

    pub fn post_response(
        &self,
        payer: &Pubkey,
        memo_ciphertext: &str,
        recent_blockhash: Hash,
    ) -> Result<ActionPostResponse> {
        let transaction =
            build_report_transaction(payer, &self.recipient, memo_ciphertext, recent_blockhash);

        Ok(ActionPostResponse {
            kind: ActionType::Transaction,
            transaction: serialize_transaction(&transaction)?,
            message: Some(self.success_message.clone()),
        })
    }
}
