//! Canned script for the demo waterfall
//!
//! Every string the bot ever says lives here. The texts are fixed
//! verbatim, concatenation quirks included (doubled spaces and periods,
//! the leading space on the architecture summary paragraph), and the
//! tests pin them down.

use super::state::Intent;
use crate::prompt::PromptSpec;

pub const ARCHITECTURE: &str = "Architecture";
pub const SPECIFICATION: &str = "Specification";

const WELCOME: &str = "Welcome and what can I do for you? You can select from options below.";

const CLIENT_NAME_QUESTION: &str = "I can help with Architecture. Please enter client name.";

const SPEC_QUESTION: &str = "I can help with Specification. Please enter what you are looking for. You can ask questions like this one:\n\n\nPlease find me the business requirements related to EBS.";

/// The one answer the demo knows, served for every specification question.
const EBS_REPLY: &str = concat!(
    "The first business requirement is to create a functionality in the EBS pre-processor to identify cash application relevant EBS files and send a copy of the EBS file for further processing in the SAP SCP payment advise for customer payments. This will be done by creating a business rule with the Bank Number/BIC and Bank Account Number/IBAN, and then checking each incoming EBS file using the business rule by comparing the values in the xml tags with the values in the business rule. If any of the comparisons is successful, a copy of the incoming file will be sent to the payment advise flows within SAP SCP. The process should not impact the main EBS pre-processing flows and should continue with the next steps regardless of the business validation.",
    "\n\n\n",
    "The second business requirement is to upload electronic bank statements (EBS) files to the SAP system. XX makes vendor payments through banks and receives customer payments through several banks. At the end of each business day, the banks send an electronic bank statement outlining the opening and closing balances and the transactions that occurred that day. The EBS file will be received through SWIFT and needs to be uploaded to SAP to reconcile XX cash accounts with the available cash in the bank. The same process is followed for both vendor and customer payments. The EBS files from the banks will be sent in BAI2 format and SAP will read these files and load the transactions accordingly.",
    "\n\n\n",
    "The role of EBS in the business requirements is to provide the electronic bank statements that are received from the banks, which are used to reconcile XXs cash accounts with the available cash in the bank. EBS is a pre-processor in the first requirement and is used to validate the incoming EBS files to ensure they are relevant to AR cash application. In the second requirement, EBS is the source of the electronic bank statements that need to be uploaded to the SAP system.",
);

/// Canned description of the one architecture on file. The leading
/// space combines with the separator in `architecture_summary_confirm`
/// to give the doubled space the tests pin down.
const ARCHITECTURE_SUMMARY: &str = " is made up of four components: Customer, Finance, HR, and Supply Chain. Their Customer solution is SAP (ECC/S4/S4CE/CX), their HR solution is SAP SuccessFactors, their Finance solution is ECC, and their Supply Chain solution is S/4 Brownfield. No connected or enabled solutions were mentioned, nor was a Hyperscaler specified.";

pub const EXIT_MESSAGE: &str =
    "I am just a demo and can no longer take questions. See you next time.";

/// Step 1: the two-option welcome menu.
pub fn welcome_prompt() -> PromptSpec {
    PromptSpec::choice(WELCOME, &[ARCHITECTURE, SPECIFICATION])
}

/// Step 2, architecture branch: ask which client to look up.
pub fn client_name_prompt() -> PromptSpec {
    PromptSpec::text(CLIENT_NAME_QUESTION)
}

/// Step 2, specification branch (also re-asked after a "no").
pub fn spec_question_prompt() -> PromptSpec {
    PromptSpec::text(SPEC_QUESTION)
}

/// Step 3, architecture branch: the lookup hit for `client`.
pub fn found_architecture_confirm(client: &str) -> PromptSpec {
    PromptSpec::confirm(format!(
        "I found one architecture for client {client}.\n\n\nDo you want to look at its summary? Select Yes to look at it, Select No to start a new architecture."
    ))
}

/// Step 3, specification branch: the canned answer plus the follow-up.
pub fn spec_answer_confirm() -> PromptSpec {
    PromptSpec::confirm(format!(
        "I found below from  {SPECIFICATION}.\n\n\n{EBS_REPLY}.\n\n\n\nDo you want to look at the detailed specifications for above summary? Select Yes to look at it, Select No to ask a new question."
    ))
}

/// Step 4, architecture branch after a "yes": summary plus the next ask.
pub fn architecture_summary_confirm(client: &str) -> PromptSpec {
    PromptSpec::confirm(format!(
        "Here is the summary of the architecture: {client} {ARCHITECTURE_SUMMARY}.\n\n\nDo you want to look at the architecture designed for above summary? Select Yes to look at it, Select No to start a new architecture."
    ))
}

/// Asked by both architecture "no" branches, one shared template.
pub fn components_prompt(client: &str) -> PromptSpec {
    PromptSpec::text(format!(
        "Sure I can help with the architecture for {client}. What components do you have for your organization? A sample answer could be Customer, Finance, HR, and Supply Chain"
    ))
}

/// Terminal acknowledgement.
pub fn success_message(intent: Intent) -> String {
    format!("Your request for {intent} is received and your deliverable is on the way.")
}
