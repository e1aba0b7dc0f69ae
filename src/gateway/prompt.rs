use super::context::PatientContextSnapshot;
use super::types::PromptMessage;
use crate::models::enums::Language;

/// Placeholders used when a patient field is unknown, per language.
struct Placeholders {
    unknown: &'static str,
    missing_id: &'static str,
}

fn placeholders(language: Language) -> Placeholders {
    match language {
        Language::En => Placeholders { unknown: "Unknown", missing_id: "N/A" },
        Language::Rw => Placeholders { unknown: "Kitazwi", missing_id: "Nta na kimwe" },
        Language::Fr => Placeholders { unknown: "Inconnu", missing_id: "N/A" },
    }
}

/// Narrative of the most recent visits, or empty when there are none.
pub fn visit_history_block(context: &PatientContextSnapshot) -> String {
    if context.recent_visits.is_empty() {
        return String::new();
    }

    let mut text = format!(
        "\n\nPatient's Recent Medical History (Last {} visits):\n",
        context.recent_visits.len()
    );
    for (i, visit) in context.recent_visits.iter().enumerate() {
        let medications = if visit.prescribed_medications.is_empty() {
            "None".to_string()
        } else {
            visit.prescribed_medications.join(", ")
        };
        text.push_str(&format!("Visit {} ({}):\n", i + 1, visit.visit_date));
        text.push_str(&format!(
            "  - Symptoms: {}\n",
            visit.symptoms.as_deref().unwrap_or("Not specified")
        ));
        text.push_str(&format!(
            "  - Diagnosis: {}\n",
            visit.diagnosis.as_deref().unwrap_or("Not specified")
        ));
        text.push_str(&format!("  - Medications: {medications}\n"));
        text.push_str(&format!(
            "  - Notes: {}\n\n",
            visit.doctor_notes.as_deref().unwrap_or("None")
        ));
    }
    text
}

/// Fill the language template with the patient block.
pub fn system_prompt(language: Language, context: &PatientContextSnapshot) -> String {
    let ph = placeholders(language);
    let patient = context.patient.as_ref();
    let name = patient.map(|p| p.full_name.as_str()).unwrap_or(ph.unknown);
    let national_id = patient
        .and_then(|p| p.national_id.as_deref())
        .unwrap_or(ph.missing_id);
    let age = patient
        .and_then(|p| p.age)
        .map(|a| a.to_string())
        .unwrap_or_else(|| ph.unknown.to_string());
    let gender = patient
        .and_then(|p| p.gender.as_deref())
        .unwrap_or(ph.unknown);
    let history = visit_history_block(context);

    match language {
        Language::En => format!(
            "You are an experienced medical AI assistant specializing in African healthcare contexts with expertise in Antimicrobial Resistance (AMR) prevention.

Patient Information:
- Name: {name}
- National ID: {national_id}
- Age: {age}
- Gender: {gender}{history}

IMPORTANT FORMATTING RULES:
- Write in a natural, conversational tone, as if speaking to a colleague
- Do NOT use markdown formatting (no **, ###, -, bullets)
- Do NOT use special characters for emphasis
- Write in clear paragraphs with natural sentences
- Use simple numbering (1, 2, 3) if listing items
- Keep responses human and professional but friendly

Your role:
1. Provide evidence-based medication recommendations based on symptoms
2. Offer differential diagnosis suggestions considering patient history
3. Alert about drug interactions and AMR risks
4. Recommend antibiotic selection that respects the WHO AWaRe classification
5. Suggest treatment protocols appropriate for African healthcare settings
6. Advise when immediate medical attention is needed

Guidelines:
- Always consider this patient's medical history when making recommendations
- Prioritize narrow-spectrum antibiotics when antibiotics are indicated
- Warn about overuse of broad-spectrum antibiotics
- Consider local resistance patterns in Rwanda and East Africa
- Provide specific dosages, frequencies, and durations when appropriate
- Include an AMR risk assessment for antibiotic recommendations

Respond in clear, natural language without any special formatting."
        ),
        Language::Rw => format!(
            "Uri umuganga w'ubuhanga wa AI ufite ubumenyi bukomeye mu by'ubuvuzi muri Afurika, cyane cyane mu kurwanya ubudahangarwa bwa mikorobe ku miti (AMR).

Amakuru y'umurwayi:
- Izina: {name}
- Indangamuntu: {national_id}
- Imyaka: {age}
- Igitsina: {gender}{history}

AMATEGEKO Y'INYANDIKO:
- Andika mu buryo busanzwe nk'uganira na mugenzi wawe
- Ntukoreshe imiterere ya markdown (nta **, ###, -)
- Ntukoreshe inyuguti zidasanzwe kugira ngo ushimangire
- Andika mu bika bifite interuro zisanzwe
- Koresha imibare yoroshye (1, 2, 3) niba ushaka gutondeka ibintu

Inshingano zawe:
1. Gutanga inama z'imiti zishingiye ku bimenyetso
2. Gutanga ibitekerezo by'indwara zishoboka ukurikije amateka y'umurwayi
3. Kuburira ku mikoranire y'imiti n'ingaruka za AMR
4. Guhitamo antibiyotike hakurikijwe WHO AWaRe
5. Gusaba uburyo bukwiye bw'ubuvuzi muri Afurika
6. Kugira inama igihe ubufasha bwihutirwa bukenewe

Subiza mu rurimi rusanzwe nta miterere idasanzwe."
        ),
        Language::Fr => format!(
            "Vous êtes un assistant médical IA expérimenté, spécialisé dans les contextes de santé africains, avec une expertise en prévention de la résistance antimicrobienne (RAM).

Informations Patient:
- Nom: {name}
- ID National: {national_id}
- Âge: {age}
- Genre: {gender}{history}

RÈGLES DE FORMATAGE IMPORTANTES:
- Écrivez sur un ton naturel et conversationnel, comme avec un collègue
- N'utilisez PAS de formatage markdown (pas de **, ###, -, puces)
- N'utilisez PAS de caractères spéciaux pour l'emphase
- Écrivez en paragraphes clairs avec des phrases naturelles
- Utilisez une numérotation simple (1, 2, 3) pour les listes

Votre rôle:
1. Fournir des recommandations de médicaments fondées sur les preuves selon les symptômes
2. Proposer un diagnostic différentiel tenant compte de l'historique du patient
3. Alerter sur les interactions médicamenteuses et les risques de RAM
4. Recommander des antibiotiques en respectant la classification WHO AWaRe
5. Suggérer des protocoles adaptés aux contextes de santé africains
6. Indiquer quand une prise en charge médicale immédiate est nécessaire

Répondez dans un langage clair et naturel, sans formatage spécial."
        ),
    }
}

/// System instruction, then prior turns, then the new user turn.
pub fn build_messages(
    system: String,
    history: Vec<PromptMessage>,
    user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(system));
    messages.extend(history);
    messages.push(PromptMessage::user(user_message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, PatientVisit};

    fn context_with_visits(n: usize) -> PatientContextSnapshot {
        PatientContextSnapshot {
            patient: Some(Patient {
                id: "p1".into(),
                full_name: "Eric Niyonzima".into(),
                national_id: Some("1199580099887766".into()),
                age: Some(29),
                gender: Some("Male".into()),
            }),
            recent_visits: (0..n)
                .map(|i| PatientVisit {
                    id: format!("v{i}"),
                    patient_id: "p1".into(),
                    visit_date: format!("2026-0{}-15", 3 - i),
                    symptoms: Some("productive cough".into()),
                    diagnosis: Some("Bronchitis".into()),
                    prescribed_medications: vec!["Amoxicillin".into(), "Paracetamol".into()],
                    doctor_notes: None,
                })
                .collect(),
        }
    }

    #[test]
    fn english_prompt_contains_identity_and_directives() {
        let prompt = system_prompt(Language::En, &context_with_visits(0));
        assert!(prompt.contains("Name: Eric Niyonzima"));
        assert!(prompt.contains("Age: 29"));
        assert!(prompt.contains("Do NOT use markdown"));
        assert!(prompt.contains("simple numbering (1, 2, 3)"));
        assert!(!prompt.contains("Recent Medical History"));
    }

    #[test]
    fn visits_are_rendered_in_order() {
        let prompt = system_prompt(Language::En, &context_with_visits(2));
        assert!(prompt.contains("Last 2 visits"));
        let first = prompt.find("Visit 1 (2026-03-15)").unwrap();
        let second = prompt.find("Visit 2 (2026-02-15)").unwrap();
        assert!(first < second);
        assert!(prompt.contains("Medications: Amoxicillin, Paracetamol"));
        assert!(prompt.contains("Notes: None"));
    }

    #[test]
    fn empty_context_uses_language_placeholders() {
        let empty = PatientContextSnapshot::empty();
        assert!(system_prompt(Language::En, &empty).contains("Name: Unknown"));
        assert!(system_prompt(Language::Rw, &empty).contains("Izina: Kitazwi"));
        assert!(system_prompt(Language::Fr, &empty).contains("Nom: Inconnu"));
    }

    #[test]
    fn each_language_has_its_own_template() {
        let ctx = context_with_visits(1);
        assert!(system_prompt(Language::Rw, &ctx).contains("Amakuru y'umurwayi"));
        assert!(system_prompt(Language::Fr, &ctx).contains("Informations Patient"));
    }

    #[test]
    fn messages_are_system_history_then_user() {
        let history = vec![
            PromptMessage::user("earlier question"),
            PromptMessage::assistant("earlier answer"),
        ];
        let messages = build_messages("SYS".into(), history, "new question");
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[0].content, "SYS");
        assert_eq!(messages[3].content, "new question");
    }
}
