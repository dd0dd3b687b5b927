use serde::Serialize;

/// Block id of the project-select prompt posted in response to `/release`.
pub const TRIGGER_RELEASE_BLOCK_ID: &str = "trigger_release_project";
/// Action id of the select menu inside the release prompt.
pub const SELECT_PROJECT_ACTION_ID: &str = "selected_release_project";
/// Block id of the CLI signing approval prompt.
pub const SIGN_CLI_BLOCK_ID: &str = "sign_cli_via_gh_action";
/// Action id of the one-time-token input inside the signing prompt.
pub const MFA_TOKEN_ACTION_ID: &str = "mfa_token_for_gh_action";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub text: TextObject,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button {
        action_id: String,
        text: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    StaticSelect {
        action_id: String,
        placeholder: TextObject,
        options: Vec<SelectOption>,
    },
    PlainTextInput {
        action_id: String,
        multiline: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
}

impl Element {
    pub fn button(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Button {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn styled_button(
        action_id: impl Into<String>,
        label: impl Into<String>,
        style: ButtonStyle,
    ) -> Self {
        Self::Button {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: Some(style),
            value: None,
        }
    }

    pub fn static_select(
        action_id: impl Into<String>,
        placeholder: impl Into<String>,
        values: &[String],
    ) -> Self {
        Self::StaticSelect {
            action_id: action_id.into(),
            placeholder: TextObject::plain(placeholder),
            options: values
                .iter()
                .map(|value| SelectOption { text: TextObject::plain(value), value: value.clone() })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        block_id: String,
        text: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<Element>,
    },
    Actions {
        block_id: String,
        elements: Vec<Element>,
    },
    Context {
        block_id: String,
        elements: Vec<TextObject>,
    },
    Input {
        block_id: String,
        label: TextObject,
        element: Element,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        let (text, accessory) = builder.build();
        self.blocks.push(Block::Section { block_id: block_id.into(), text, accessory });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: Element,
    ) -> Self {
        self.blocks.push(Block::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element,
        });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    accessory: Option<Element>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    pub fn accessory(&mut self, element: Element) -> &mut Self {
        self.accessory = Some(element);
        self
    }

    fn build(self) -> (TextObject, Option<Element>) {
        (self.text.unwrap_or_else(|| TextObject::plain("")), self.accessory)
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<Element>,
}

impl ActionsBuilder {
    pub fn element(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    fn build(self) -> Vec<Element> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// The `/release` response: one section with a static-select accessory
/// listing every configured release target.
pub fn project_select_message(project_names: &[String]) -> MessageTemplate {
    MessageBuilder::new("Select the project to release")
        .section(TRIGGER_RELEASE_BLOCK_ID, |section| {
            section
                .mrkdwn(":wave: Select the project to release")
                .accessory(Element::static_select(
                    SELECT_PROJECT_ACTION_ID,
                    "release projects",
                    project_names,
                ));
        })
        .build()
}

/// Approval prompt posted when a mention asks to sign a CLI build. The
/// first two sections survive approval; the input and button blocks are
/// replaced by the approval notice.
pub fn signing_approval_message(tag: &str, build_link: &str) -> MessageTemplate {
    MessageBuilder::new(format!("CLI {tag} is ready to be signed"))
        .section("sign_cli_header", |section| {
            section.mrkdwn(
                "*A new release of the CLI is ready to be signed.*\n\n\
                 Only authorized users with a configured authenticator can approve this action.",
            );
        })
        .section("sign_cli_details", |section| {
            section.mrkdwn(format!(
                "*:1234: Version:* {tag}\n*:gear: Triggered by pipeline:*\n{build_link}"
            ));
        })
        .input(
            SIGN_CLI_BLOCK_ID,
            ":key: MFA Token",
            // Tokens are always 6 digits.
            Element::PlainTextInput {
                action_id: MFA_TOKEN_ACTION_ID.to_string(),
                multiline: false,
                max_length: Some(6),
            },
        )
        .actions("sign_cli_approve", |actions| {
            actions.element(Element::styled_button("approve_sign_cli", "Approve", ButtonStyle::Primary));
        })
        .build()
}

/// Rewrite of the signing prompt after approval: the original header and
/// details sections are preserved and the interactive blocks are replaced
/// with a single "approved by" section.
pub fn approval_granted_message(original_blocks: &[Block], user_name: &str) -> MessageTemplate {
    let mut blocks: Vec<Block> = original_blocks.iter().take(2).cloned().collect();
    blocks.push(Block::Section {
        block_id: "sign_cli_approved".to_string(),
        text: TextObject::mrkdwn(format!("\n:white_check_mark: *Approved by {user_name}*")),
        accessory: None,
    });

    MessageTemplate { fallback_text: format!("Approved by {user_name}"), blocks }
}

/// Help card posted when a mention matches none of the known request forms.
pub fn mention_help_message() -> MessageTemplate {
    MessageBuilder::new("Release relay help")
        .section("relay_help", |section| {
            section.mrkdwn(
                ":wave: Hi there!\n\n\
                 There are three things I can help you with:\n\n\
                 *1. To trigger releases from the configured list of projects*\nType: `/release`\n\n\
                 *2. To sign the CLI artifacts*\nType: `@relay sign_cli VERSION BUILD_LINK`\n\n\
                 *3. To trigger Github Workflows*\nType: `@relay trigger_action:WORKFLOW_ID --repo [HOST/]OWNER/REPO`",
            );
        })
        .build()
}
