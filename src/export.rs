// Flat CSV export of a finished batch
use crate::model::Lead;
use std::fs;
use std::path::Path;

const HEADER: &str =
    "id,name,address,city,business_type,phone,email,website,instagram,linkedin,\
     opportunity_score,grade,contacted";

pub fn write_csv(path: &str, leads: &[Lead]) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, leads_to_csv(leads))
}

pub fn leads_to_csv(leads: &[Lead]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for lead in leads {
        let row = [
            lead.id.map(|id| id.to_string()).unwrap_or_default(),
            csv_field(&lead.name),
            csv_field(&lead.address),
            csv_field(&lead.city),
            csv_field(&lead.business_type),
            csv_field(lead.phone.as_deref().unwrap_or("")),
            csv_field(lead.email.as_deref().unwrap_or("")),
            csv_field(lead.website.as_deref().unwrap_or("")),
            csv_field(lead.instagram.as_deref().unwrap_or("")),
            csv_field(lead.linkedin.as_deref().unwrap_or("")),
            lead.meta
                .score
                .as_ref()
                .map(|s| format!("{:.1}", s.opportunity_score))
                .unwrap_or_default(),
            lead.meta
                .score
                .as_ref()
                .map(|s| s.grade.as_str().to_string())
                .unwrap_or_default(),
            lead.meta.contacted.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Grade, LeadMeta, Score};

    #[test]
    fn quotes_fields_with_commas() {
        let lead = Lead {
            id: Some(3),
            name: "Blue Cafe".to_string(),
            address: "45 Main Street, Ahmedabad".to_string(),
            lat: None,
            lng: None,
            phone: None,
            email: Some("hi@bluecafe.example".to_string()),
            website: None,
            instagram: None,
            linkedin: None,
            city: "Ahmedabad".to_string(),
            business_type: "cafe".to_string(),
            source: "osm".to_string(),
            meta: LeadMeta {
                score: Some(Score {
                    opportunity_score: 99.0,
                    grade: Grade::High,
                }),
                ..Default::default()
            },
        };
        let csv = leads_to_csv(&[lead]);
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("id,name,address"));
        let row = lines.next().unwrap();
        assert!(row.contains("\"45 Main Street, Ahmedabad\""));
        assert!(row.contains("99.0,HIGH,false"));
    }
}
