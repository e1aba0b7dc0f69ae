//! Canned clinical library served when no live model answers.
//!
//! Entries are evaluated in table order against the lower-cased user message;
//! the first matching predicate wins. The default block is used when nothing
//! matches, including for an empty message.

use crate::models::enums::Language;

/// One entry of the fallback table.
pub struct FallbackEntry {
    pub topic: &'static str,
    pub matches: fn(&str) -> bool,
    pub response: &'static str,
}

fn has_all(message: &str, words: &[&str]) -> bool {
    words.iter().all(|w| message.contains(w))
}

fn has_any(message: &str, words: &[&str]) -> bool {
    words.iter().any(|w| message.contains(w))
}

fn is_fever_headache(m: &str) -> bool {
    has_all(m, &["fever", "headache"])
}

fn is_cough_fever(m: &str) -> bool {
    has_all(m, &["cough", "fever"])
}

fn is_stomach_pain(m: &str) -> bool {
    has_all(m, &["pain", "stomach"])
}

fn is_antibiotic(m: &str) -> bool {
    has_any(m, &["antibiotic", "resistance"])
}

fn is_pediatric(m: &str) -> bool {
    has_any(m, &["child", "pediatric"])
}

fn is_pregnancy(m: &str) -> bool {
    has_any(m, &["pregnancy", "pregnant"])
}

fn is_treatment(m: &str) -> bool {
    m.contains("treatment")
}

fn is_diagnosis(m: &str) -> bool {
    m.contains("diagnosis")
}

pub static FALLBACK_TABLE: &[FallbackEntry] = &[
    FallbackEntry {
        topic: "fever_headache",
        matches: is_fever_headache,
        response: FEVER_HEADACHE,
    },
    FallbackEntry {
        topic: "cough_fever",
        matches: is_cough_fever,
        response: COUGH_FEVER,
    },
    FallbackEntry {
        topic: "stomach_pain",
        matches: is_stomach_pain,
        response: STOMACH_PAIN,
    },
    FallbackEntry {
        topic: "antibiotic_stewardship",
        matches: is_antibiotic,
        response: ANTIBIOTIC_STEWARDSHIP,
    },
    FallbackEntry {
        topic: "pediatric",
        matches: is_pediatric,
        response: PEDIATRIC,
    },
    FallbackEntry {
        topic: "pregnancy",
        matches: is_pregnancy,
        response: PREGNANCY,
    },
    FallbackEntry {
        topic: "treatment",
        matches: is_treatment,
        response: TREATMENT,
    },
    FallbackEntry {
        topic: "diagnosis",
        matches: is_diagnosis,
        response: DIAGNOSIS,
    },
];

/// First matching table entry for `message`, if any.
pub fn match_entry(message: &str) -> Option<&'static FallbackEntry> {
    let lowered = message.to_lowercase();
    FALLBACK_TABLE.iter().find(|entry| (entry.matches)(&lowered))
}

/// Deterministic fallback text for a user message.
pub fn fallback_response(message: &str) -> String {
    match match_entry(message) {
        Some(entry) => entry.response.to_string(),
        None => default_response(message),
    }
}

/// The message is quoted verbatim, even when empty.
fn default_response(message: &str) -> String {
    format!("Clinical consultation regarding: {message}\n\n{DEFAULT_BODY}")
}

/// Fixed apology returned at the error boundary.
pub fn apology(language: Language) -> &'static str {
    match language {
        Language::En => "I apologize, but I'm experiencing technical difficulties. Please try again in a moment or consult with your medical team for immediate assistance.",
        Language::Rw => "Mutwihanganire, turimo guhura n'ibibazo bya tekiniki. Nyamuneka ongera ugerageze mu kanya gato cyangwa ubaze itsinda ry'abaganga kugira ngo ubone ubufasha bwihuse.",
        Language::Fr => "Je m'excuse, mais je rencontre des difficultés techniques. Veuillez réessayer dans un moment ou consulter votre équipe médicale pour une assistance immédiate.",
    }
}

const FEVER_HEADACHE: &str = "Based on the symptoms of fever and headache, here are my clinical recommendations:

IMMEDIATE ASSESSMENT:
This presentation suggests a viral syndrome, though bacterial causes must be considered given the fever pattern.

TREATMENT PROTOCOL:
1. Paracetamol 500mg every 6 hours for fever control and pain relief
2. Ensure adequate hydration - 2-3 liters fluid daily
3. Complete rest for 48-72 hours
4. Monitor temperature every 4 hours

ANTIBIOTIC CONSIDERATIONS:
No empirical antibiotics indicated at this stage. Reserve for clear bacterial indicators such as persistent high fever >72 hours, signs of meningism, or blood culture positivity.

RED FLAGS - IMMEDIATE REFERRAL:
- Neck stiffness or photophobia
- Persistent vomiting
- Altered consciousness
- Petechial rash

FOLLOW-UP:
Return in 48 hours if no improvement or immediately if concerning symptoms develop.";

const COUGH_FEVER: &str = "For respiratory symptoms with fever, my clinical assessment indicates:

LIKELY DIAGNOSIS:
Upper respiratory tract infection with possible bacterial component given fever presence.

MANAGEMENT APPROACH:
1. Symptomatic relief with paracetamol 500mg QID
2. Dextromethorphan 15mg TID for dry cough
3. Adequate hydration and humidification
4. Rest and isolation to prevent transmission

ANTIBIOTIC DECISION:
Consider amoxicillin 500mg TID x 5 days if:
- Purulent sputum production
- Fever >38.5°C for >72 hours
- Signs of pneumonia on examination

AMR STEWARDSHIP:
Avoid broad-spectrum antibiotics. If bacterial infection confirmed, complete full course to prevent resistance development.

MONITORING:
Daily temperature monitoring. Return if breathlessness, chest pain, or clinical deterioration occurs.";

const STOMACH_PAIN: &str = "For abdominal pain presentation, my clinical evaluation suggests:

DIFFERENTIAL DIAGNOSIS:
Consider gastritis, peptic ulcer disease, or functional dyspepsia based on symptom pattern.

INITIAL MANAGEMENT:
1. Omeprazole 20mg once daily before breakfast
2. Antacid tablets PRN for symptom relief
3. Dietary modification - avoid spicy, fatty foods
4. Small, frequent meals

ANTIBIOTIC CONSIDERATIONS:
H. pylori eradication may be needed if ulcer confirmed. Standard triple therapy includes amoxicillin + clarithromycin + PPI.

WARNING SIGNS:
- Severe persistent pain
- Vomiting with blood
- Black tarry stools
- Significant weight loss

FOLLOW-UP:
Review in 2 weeks. Consider endoscopy if symptoms persist or alarm features present.";

const ANTIBIOTIC_STEWARDSHIP: &str = "Regarding antibiotic stewardship and AMR prevention:

WHO AWaRe CLASSIFICATION:
ACCESS antibiotics (first-choice): Amoxicillin, doxycycline - use preferentially
WATCH antibiotics (second-choice): Ciprofloxacin, ceftriaxone - use with caution
RESERVE antibiotics: Colistin, linezolid - hospital use only

PRESCRIBING PRINCIPLES:
1. Culture before treatment when possible
2. Narrow spectrum preferred over broad spectrum
3. Appropriate duration - typically 5-7 days
4. Consider local resistance patterns

PATIENT EDUCATION:
- Complete prescribed course even if feeling better
- Never share antibiotics with others
- Store properly and dispose of unused medications
- Understand difference between viral and bacterial infections

RESISTANCE PREVENTION:
Every prescription impacts community resistance. Judicious use protects both current patient and future patients in your practice.";

const PEDIATRIC: &str = "For pediatric cases, special considerations apply:

PEDIATRIC DOSING:
- Paracetamol: 10-15mg/kg every 4-6 hours (max 60mg/kg/day)
- Ibuprofen: 5-10mg/kg every 6-8 hours (if >6 months)
- Amoxicillin: 40-50mg/kg/day divided TID (if indicated)

CLINICAL ASSESSMENT:
Children dehydrate quickly. Monitor:
- Urine output and skin turgor
- Activity level and feeding pattern
- Temperature trends

ANTIBIOTIC STEWARDSHIP:
Avoid antibiotics for viral illnesses. Most childhood fevers are viral and self-limiting. Consider bacterial infection if:
- Persistent fever >72 hours
- Toxic appearance
- Specific bacterial syndrome signs

SAFETY CONSIDERATIONS:
Never give aspirin to children under 16 due to Reye's syndrome risk. Ensure accurate weight-based dosing.";

const PREGNANCY: &str = "For pregnant patients, safety considerations are paramount:

PREGNANCY-SAFE MEDICATIONS:
- Paracetamol: Safe throughout pregnancy for fever/pain
- Amoxicillin: Category B - safe if indicated
- Erythromycin: Safe alternative if penicillin allergy

AVOID IN PREGNANCY:
- Tetracyclines (tooth staining)
- Quinolones (cartilage effects)
- Trimethoprim (folate antagonist)

CLINICAL APPROACH:
1. Careful risk-benefit assessment
2. Use lowest effective dose
3. Shortest appropriate duration
4. Monitor closely for adverse effects

SPECIFIC CONCERNS:
- UTIs require prompt treatment to prevent pyelonephritis
- Respiratory infections need careful monitoring
- Group B Strep screening at 36 weeks

FOLLOW-UP:
More frequent monitoring in pregnancy. Coordinate with obstetric care provider.";

const TREATMENT: &str = "Treatment approach for this clinical scenario:

EVIDENCE-BASED MANAGEMENT:
Current guidelines recommend a stepped approach beginning with conservative management before escalating to pharmaceutical intervention.

FIRST-LINE THERAPY:
Conservative measures including lifestyle modifications, patient education, and symptom monitoring often provide significant benefit.

PHARMACOLOGICAL OPTIONS:
When medications are indicated, start with proven first-line agents. Consider patient factors including age, comorbidities, and medication history.

ANTIBIOTIC CONSIDERATIONS:
Only prescribe antibiotics when clear bacterial infection is suspected or confirmed. Use narrow-spectrum agents when possible to minimize resistance development.

MONITORING STRATEGY:
Establish clear follow-up intervals. Provide patients with specific return instructions and warning signs to monitor.

PATIENT EDUCATION:
Ensure patients understand their condition, treatment plan, and importance of medication adherence.";

const DIAGNOSIS: &str = "Diagnostic approach for this clinical presentation:

CLINICAL ASSESSMENT:
Systematic history and physical examination guide diagnostic reasoning. Consider patient demographics, symptom onset, and risk factors.

DIFFERENTIAL DIAGNOSIS:
Develop a prioritized list of possibilities based on clinical presentation. Consider common conditions first, but don't miss serious diagnoses.

DIAGNOSTIC TESTING:
Order investigations judiciously. Consider cost-effectiveness and patient comfort. Basic tests often provide most useful information.

CLINICAL DECISION MAKING:
Balance probability of disease against test characteristics. Some conditions require empirical treatment pending results.

DOCUMENTATION:
Record clinical reasoning clearly. This supports quality improvement and medico-legal requirements.

FOLLOW-UP PLANNING:
Establish clear next steps based on test results and clinical response. Safety netting is essential.";

const DEFAULT_BODY: &str = "MEDICAL ASSESSMENT:
I've analyzed this case considering current evidence-based medicine guidelines and AMR prevention strategies.

CLINICAL REASONING:
The symptoms and presentation suggest several possible diagnoses that require systematic evaluation and appropriate management.

TREATMENT RECOMMENDATIONS:
1. Symptomatic management with appropriate medications
2. Monitoring for clinical improvement or deterioration
3. Patient education regarding condition and treatment
4. Clear follow-up plan with specific return instructions

ANTIMICROBIAL STEWARDSHIP:
Any antibiotic use must be justified by clinical need. Consider local resistance patterns and choose narrow-spectrum agents when possible.

SAFETY CONSIDERATIONS:
Monitor for adverse effects and drug interactions. Ensure patient understands proper medication use and storage.

PROGNOSIS:
Most cases resolve with appropriate treatment. Provide realistic expectations about recovery timeframe and warning signs.

Would you like me to elaborate on any specific aspect of this clinical assessment?";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fever_and_headache_selects_immediate_assessment_block() {
        let reply = fallback_response("Patient has fever, headache, and body aches for two days");
        assert!(reply.contains("IMMEDIATE ASSESSMENT"));
    }

    #[test]
    fn fever_headache_outranks_treatment() {
        let entry = match_entry("Fever and headache, what treatment?").unwrap();
        assert_eq!(entry.topic, "fever_headache");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(match_entry("PERSISTENT COUGH WITH FEVER").unwrap().topic, "cough_fever");
    }

    #[test]
    fn single_keyword_of_a_pair_does_not_match_pair_entry() {
        // "fever" alone matches neither fever+headache nor cough+fever.
        assert!(match_entry("mild fever since yesterday").is_none());
    }

    #[test]
    fn table_order_is_the_priority() {
        let cases = [
            ("stomach pain after meals", "stomach_pain"),
            ("antibiotic choice for UTI", "antibiotic_stewardship"),
            ("pediatric dosing of paracetamol", "pediatric"),
            ("pregnant woman with nausea", "pregnancy"),
            ("treatment options", "treatment"),
            ("differential diagnosis please", "diagnosis"),
            // Both pediatric and pregnancy keywords; pediatric comes first.
            ("pregnant mother asks about her child", "pediatric"),
        ];
        for (message, topic) in cases {
            assert_eq!(match_entry(message).unwrap().topic, topic, "{message}");
        }
    }

    #[test]
    fn same_message_gives_same_block() {
        let a = fallback_response("cough and fever");
        let b = fallback_response("cough and fever");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_message_takes_default_block() {
        let reply = fallback_response("");
        assert!(reply.starts_with("Clinical consultation regarding: \n\nMEDICAL ASSESSMENT:"));
    }

    #[test]
    fn default_block_quotes_the_message() {
        let reply = fallback_response("swollen ankle");
        assert!(reply.starts_with("Clinical consultation regarding: swollen ankle\n\n"));
        // Quoted as typed, not lower-cased.
        let reply = fallback_response("Swollen ANKLE");
        assert!(reply.starts_with("Clinical consultation regarding: Swollen ANKLE\n\n"));
    }

    #[test]
    fn clinical_blocks_keep_their_fixed_wording() {
        let pregnancy = fallback_response("pregnant patient");
        assert!(pregnancy.contains("- Amoxicillin: Category B - safe if indicated"));
        let default = fallback_response("swollen ankle");
        assert!(default.contains(
            "I've analyzed this case considering current evidence-based medicine guidelines and AMR prevention strategies."
        ));
        assert!(default.ends_with("Would you like me to elaborate on any specific aspect of this clinical assessment?"));
        let cough = fallback_response("cough with fever");
        assert!(cough.contains("Consider amoxicillin 500mg TID x 5 days if:"));
    }

    #[test]
    fn apology_exists_for_every_language() {
        for lang in [Language::En, Language::Rw, Language::Fr] {
            assert!(!apology(lang).is_empty());
        }
        assert!(apology(Language::Fr).starts_with("Je m'excuse"));
    }
}
