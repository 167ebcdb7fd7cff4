use crate::types::Lead;

/// Title words that mark a decision maker.
pub const DECISION_MAKER_TITLES: &[&str] = &["ceo", "cto", "founder", "director", "vp", "manager", "head"];

pub const SCORE_EMAIL: u8 = 30;
pub const SCORE_DECISION_MAKER: u8 = 25;
pub const SCORE_ANY_TITLE: u8 = 15;
pub const SCORE_COMPANY: u8 = 20;
pub const SCORE_PHONE: u8 = 15;
pub const SCORE_LINKEDIN: u8 = 10;
pub const MAX_SCORE: u8 = 100;

/// Heuristic lead quality in 0..=100. Pure function of the lead's contact fields.
pub fn score_lead(lead: &Lead) -> u8 {
    let mut score: u32 = 0;

    if let Some(email) = lead.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !email.to_ascii_lowercase().contains("example") {
            score += SCORE_EMAIL as u32;
        }
    }

    let title = lead.title.trim();
    if is_decision_maker(title) {
        score += SCORE_DECISION_MAKER as u32;
    } else if !title.is_empty() {
        score += SCORE_ANY_TITLE as u32;
    }

    if lead.company.trim().chars().count() > 2 {
        score += SCORE_COMPANY as u32;
    }
    if lead.has_phone() {
        score += SCORE_PHONE as u32;
    }
    if !lead.linkedin_url.trim().is_empty() {
        score += SCORE_LINKEDIN as u32;
    }

    score.min(MAX_SCORE as u32) as u8
}

/// Whole-word match against the decision-maker vocabulary, so
/// "Co-Founder" and "VP of Sales" match but "Headquarters Clerk" does not.
pub fn is_decision_maker(title: &str) -> bool {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|word| {
            let word = word.to_lowercase();
            DECISION_MAKER_TITLES.contains(&word.as_str())
        })
}

/// Key two leads must share to count as the same contact.
///
/// Email when present; otherwise name and company together; otherwise the
/// LinkedIn URL. A lead with none of these has no key and is never a duplicate.
pub fn dedup_key(lead: &Lead) -> Option<String> {
    if let Some(email) = lead.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        return Some(format!("email:{}", email.to_lowercase()));
    }

    let name = collapse(&lead.full_name);
    let company = collapse(&lead.company);
    if !name.is_empty() && !company.is_empty() {
        return Some(format!("name:{name}|{company}"));
    }

    let linkedin = lead.linkedin_url.trim().trim_end_matches('/').to_lowercase();
    if !linkedin.is_empty() {
        return Some(format!("linkedin:{linkedin}"));
    }

    None
}

fn collapse(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
