//! Finnish HTML bodies for transactional mail.

use chrono::NaiveDateTime;

use crate::models::{Appointment, UserSummary, Vendor};

pub const DEFAULT_SERVICE_NAME: &str = "Palvelu";

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `d.M.yyyy klo HH:mm`, e.g. `5.3.2025 klo 09:30`.
pub fn format_appointment_time(date: &NaiveDateTime) -> String {
    date.format("%-d.%-m.%Y klo %H:%M").to_string()
}

fn service_name(appointment: &Appointment) -> String {
    appointment.service_name.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string())
}

pub fn appointment_confirmation(appointment: &Appointment, vendor: &Vendor) -> String {
    format!(
        "<h2>Varaus vahvistettu</h2>\n\
         <p>Hei {first},</p>\n\
         <p>Varauksesi on vahvistettu:</p>\n\
         <ul>\n\
         <li>Palvelu: {service}</li>\n\
         <li>Päivämäärä: {date}</li>\n\
         <li>Yritys: {business}</li>\n\
         <li>Osoite: {address}</li>\n\
         <li>Hinta: {price}€</li>\n\
         </ul>\n",
        first = escape_html(&appointment.customer_details.first_name),
        service = escape_html(&service_name(appointment)),
        date = format_appointment_time(&appointment.date),
        business = escape_html(&vendor.business_name),
        address = escape_html(vendor.address.as_deref().unwrap_or("")),
        price = appointment.total_price,
    )
}

pub fn appointment_reminder(appointment: &Appointment, vendor: &Vendor) -> String {
    format!(
        "<h2>Muistutus huomisesta varauksesta</h2>\n\
         <p>Hei {first},</p>\n\
         <p>Muistathan huomisen varauksesi:</p>\n\
         <ul>\n\
         <li>Palvelu: {service}</li>\n\
         <li>Päivämäärä: {date}</li>\n\
         <li>Yritys: {business}</li>\n\
         <li>Osoite: {address}</li>\n\
         </ul>\n",
        first = escape_html(&appointment.customer_details.first_name),
        service = escape_html(&service_name(appointment)),
        date = format_appointment_time(&appointment.date),
        business = escape_html(&vendor.business_name),
        address = escape_html(vendor.address.as_deref().unwrap_or("")),
    )
}

pub fn welcome(user: &UserSummary) -> String {
    let name = user.first_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("käyttäjä");
    format!(
        "<h2>Tervetuloa Biloon!</h2>\n\
         <p>Hei {},</p>\n\
         <p>Kiitos rekisteröitymisestäsi. Olemme antaneet sinulle 10 kolikkoa tervetuliaislahjana.</p>\n\
         <p>Voit käyttää kolikoita alennuksiin varatessasi palveluita.</p>\n",
        escape_html(name)
    )
}

pub fn vendor_notice(message: &str) -> String {
    format!("<p>{}</p>", escape_html(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerDetails;
    use chrono::NaiveDate;

    fn appointment() -> Appointment {
        Appointment {
            date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap().and_hms_opt(9, 30, 0).unwrap(),
            service_name: None,
            total_price: 45.0,
            customer_details: CustomerDetails { first_name: "Aino".into(), last_name: "Virtanen".into(), email: "aino@example.fi".into() },
            feedback: None,
        }
    }

    fn vendor() -> Vendor {
        Vendor { id: "v1".into(), business_name: "Pesu & Kiilto".into(), address: Some("Mannerheimintie 1".into()), ..Default::default() }
    }

    #[test]
    fn confirmation_contains_details() {
        let html = appointment_confirmation(&appointment(), &vendor());
        assert!(html.contains("Hei Aino,"));
        assert!(html.contains("Palvelu: Palvelu"));
        assert!(html.contains("Päivämäärä: 5.3.2025 klo 09:30"));
        assert!(html.contains("Yritys: Pesu &amp; Kiilto"));
        assert!(html.contains("Hinta: 45€"));
    }

    #[test]
    fn reminder_has_no_price() {
        let mut a = appointment();
        a.service_name = Some("Käsinpesu".into());
        let html = appointment_reminder(&a, &vendor());
        assert!(html.contains("Palvelu: Käsinpesu"));
        assert!(!html.contains("Hinta"));
    }

    #[test]
    fn welcome_falls_back_to_generic_name() {
        let html = welcome(&UserSummary { email: "x@example.fi".into(), first_name: None });
        assert!(html.contains("Hei käyttäjä,"));
        assert!(html.contains("10 kolikkoa"));
    }

    #[test]
    fn notice_is_escaped() {
        assert_eq!(vendor_notice("<b>hi</b>"), "<p>&lt;b&gt;hi&lt;/b&gt;</p>");
    }
}
