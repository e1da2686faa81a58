use trainer_core::model::{DifficultyRange, Scenario, ScenarioDraft, ScenarioId};

/// Built-in seed set used by `JsonCatalog::create_if_missing` and tests.
///
/// A deliberately small spread: every difficulty from 1 to 5 is represented
/// at least once, across several themes.
///
/// # Panics
///
/// Never panics in practice; the samples are validated against the default
/// range and kept in-range by construction.
#[must_use]
pub fn sample_scenarios() -> Vec<Scenario> {
    let range = DifficultyRange::default();
    raw_samples()
        .into_iter()
        .map(|draft| {
            draft
                .validate(&range)
                .expect("built-in sample scenario should be valid")
        })
        .collect()
}

fn raw_samples() -> Vec<ScenarioDraft> {
    vec![
        ScenarioDraft {
            id: ScenarioId::new("phish_001"),
            title: "Suspicious Email Alert".into(),
            description: "A basic email phishing attempt".into(),
            content: "You receive an email with the subject 'Urgent: Your account has been \
                      compromised'. It asks you to click a link and enter your credentials. \
                      The sender is 'security-alert@g00gle.com'. What should you do?"
                .into(),
            options: vec![
                "Click the link and enter your credentials".into(),
                "Ignore the email and delete it".into(),
                "Forward the email to your IT department and report it as suspicious".into(),
                "Reply to the sender asking for more information".into(),
            ],
            correct_answer: 2,
            difficulty: 1,
            explanation: "The sender's domain 'g00gle.com' is spoofed (zeros instead of 'o's). \
                          Legitimate security alerts don't ask you to click links and enter \
                          credentials. Report suspicious emails to IT."
                .into(),
            theme: "email phishing".into(),
        },
        ScenarioDraft {
            id: ScenarioId::new("malware_001"),
            title: "Suspicious Attachment".into(),
            description: "Identifying a malicious email attachment".into(),
            content: "An email titled 'Invoice for your recent purchase' carries an attachment \
                      named 'Invoice_details.exe'. You don't recall any purchase. What should \
                      you do?"
                .into(),
            options: vec![
                "Open the attachment to see what purchase it refers to".into(),
                "Reply to the sender asking for clarification".into(),
                "Delete the email without opening the attachment".into(),
                "Save the attachment and scan it with antivirus software".into(),
            ],
            correct_answer: 2,
            difficulty: 1,
            explanation: "Executable files sent via email are almost always malicious. Delete \
                          the email without opening anything."
                .into(),
            theme: "malware".into(),
        },
        ScenarioDraft {
            id: ScenarioId::new("social_001"),
            title: "Unexpected Call from IT".into(),
            description: "A social engineering attempt via phone".into(),
            content: "A caller claiming to be from your company's IT department says they've \
                      detected suspicious activity and need your password to fix it. What \
                      should you do?"
                .into(),
            options: vec![
                "Provide your password since they're from IT".into(),
                "Ask for their employee ID and call back the official IT helpdesk".into(),
                "Tell them you'll change your password yourself".into(),
                "Hang up immediately without saying anything".into(),
            ],
            correct_answer: 1,
            difficulty: 2,
            explanation: "IT staff never ask for your password. Verify the caller through the \
                          official helpdesk number you look up independently."
                .into(),
            theme: "social engineering".into(),
        },
        ScenarioDraft {
            id: ScenarioId::new("security_001"),
            title: "Public WiFi Usage".into(),
            description: "Identifying secure practices for public WiFi".into(),
            content: "You're at a coffee shop and need to access your company's financial \
                      reports. The shop offers free WiFi. What is the most secure option?"
                .into(),
            options: vec![
                "Connect to the free WiFi and access the documents".into(),
                "Ask the barista for the WiFi password first".into(),
                "Use your phone's mobile hotspot instead".into(),
                "Wait until you return to the office".into(),
            ],
            correct_answer: 2,
            difficulty: 2,
            explanation: "Public WiFi, even password-protected, is not safe for sensitive \
                          data. A mobile hotspot gives you a private connection."
                .into(),
            theme: "network security".into(),
        },
        ScenarioDraft {
            id: ScenarioId::new("phish_003"),
            title: "CEO Urgent Request".into(),
            description: "A whaling/spear-phishing attempt".into(),
            content: "An email appearing to come from your CEO reads: 'I'm in an emergency \
                      meeting and need you to buy $500 in gift cards for a client. Keep this \
                      confidential and send me the codes ASAP.' What should you do?"
                .into(),
            options: vec![
                "Purchase the gift cards and send the codes".into(),
                "Reply to the email asking for more details".into(),
                "Contact the CEO through another channel to verify the request".into(),
                "Forward the email to your supervisor for guidance".into(),
            ],
            correct_answer: 2,
            difficulty: 3,
            explanation: "Classic CEO fraud. Unusual requests involving money or gift cards \
                          must be verified through a different communication channel."
                .into(),
            theme: "whaling".into(),
        },
        ScenarioDraft {
            id: ScenarioId::new("ransomware_001"),
            title: "Macro-Enabled Document".into(),
            description: "Recognizing a ransomware delivery vector".into(),
            content: "A colleague received an Office document by email that asks them to \
                      'Enable Macros' to view the content. What advice should you give?"
                .into(),
            options: vec![
                "Enable macros if the document looks important".into(),
                "Scan the document with antivirus before opening".into(),
                "Never enable macros on emailed documents and delete this one".into(),
                "Forward the email to IT before taking any action".into(),
            ],
            correct_answer: 3,
            difficulty: 3,
            explanation: "Malicious macros are a primary ransomware vector. Forward \
                          suspicious emails to IT for analysis without opening attachments."
                .into(),
            theme: "ransomware".into(),
        },
        ScenarioDraft {
            id: ScenarioId::new("phish_004"),
            title: "Advanced Spear Phishing".into(),
            description: "A targeted phishing attempt with personal information".into(),
            content: "An email references a conference you recently attended, with details \
                      about your presentation, and links to 'additional resources'. The \
                      sender's name is unfamiliar. What should you do?"
                .into(),
            options: vec![
                "Click the link since the email shows knowledge of your activities".into(),
                "Reply thanking them for the resources".into(),
                "Check the email header and link destination before deciding".into(),
                "Delete the email since you don't recognize the sender".into(),
            ],
            correct_answer: 2,
            difficulty: 4,
            explanation: "Spear phishers research their targets to build trust. Verify the \
                          header and hover over links to check their true destination first."
                .into(),
            theme: "spear phishing".into(),
        },
        ScenarioDraft {
            id: ScenarioId::new("security_003"),
            title: "Data Exfiltration Attempt".into(),
            description: "Recognizing and responding to data theft attempts".into(),
            content: "You notice a coworker copying large amounts of company data to a \
                      personal USB drive after hours. What is the most appropriate action?"
                .into(),
            options: vec![
                "Confront them directly about what they're doing".into(),
                "Do nothing, it's not your responsibility".into(),
                "Casually ask them what project they're working on so late".into(),
                "Report the behavior to security or management without confrontation".into(),
            ],
            correct_answer: 3,
            difficulty: 5,
            explanation: "Confrontation could be dangerous or let them cover their tracks. \
                          Report suspicious behavior to the people trained to handle it."
                .into(),
            theme: "insider threat".into(),
        },
    ]
}
