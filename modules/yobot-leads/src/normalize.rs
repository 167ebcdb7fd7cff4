use std::collections::HashSet;

use yobot_common::validation::{is_valid_email, is_valid_phone};
use yobot_common::{dedup_key, score_lead, Lead};

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub leads: Vec<Lead>,
    pub duplicates_dropped: usize,
}

/// Trim every text field, lowercase the email, turn blank or malformed
/// email/phone into `None`, then score.
pub fn normalize_lead(mut lead: Lead) -> Lead {
    for field in [
        &mut lead.full_name,
        &mut lead.company,
        &mut lead.title,
        &mut lead.location,
        &mut lead.industry,
        &mut lead.employee_count,
        &mut lead.website,
        &mut lead.linkedin_url,
    ] {
        if field.trim().len() != field.len() {
            *field = field.trim().to_string();
        }
    }
    lead.email = blank_to_none(lead.email.take())
        .filter(|e| is_valid_email(e))
        .map(|e| e.to_lowercase());
    lead.phone = blank_to_none(lead.phone.take()).filter(|p| is_valid_phone(p));
    lead.is_duplicate = false;
    lead.score = score_lead(&lead);
    lead
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize and score a provider batch, dropping in-batch duplicates.
/// The first occurrence of a key wins.
pub fn normalize_batch(leads: Vec<Lead>) -> NormalizedBatch {
    let mut seen = HashSet::new();
    let mut batch = NormalizedBatch::default();

    for lead in leads.into_iter().map(normalize_lead) {
        let Some(key) = dedup_key(&lead) else {
            batch.leads.push(lead);
            continue;
        };
        if seen.insert(key) {
            batch.leads.push(lead);
        } else {
            batch.duplicates_dropped += 1;
        }
    }
    batch
}

/// Flag leads whose key already appeared earlier in an oldest-first listing.
pub fn mark_duplicates(leads: &mut [Lead]) {
    let mut seen = HashSet::new();
    for lead in leads {
        lead.is_duplicate = dedup_key(lead).is_some_and(|key| !seen.insert(key));
    }
}
