//! schema.org JSON-LD for vendor pages.
//! Optional fields that are missing or empty are left out of the document entirely;
//! the output never carries `null` values.

use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

use crate::models::{Appointment, Service, Vendor};

pub const OFFER_CATALOG_NAME: &str = "Autopesupalvelut";

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn put_opt(obj: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        obj.insert(key.to_string(), Value::String(v.to_string()));
    }
}

fn opening_hours(vendor: &Vendor) -> Vec<Value> {
    vendor
        .operating_hours
        .iter()
        .filter(|(_, h)| !h.is_closed())
        .map(|(day, h)| {
            let (opens, closes) = if h.is_all_day() { ("00:00", "24:00") } else { (h.open.as_str(), h.close.as_str()) };
            json!({
                "@type": "OpeningHoursSpecification",
                "dayOfWeek": day.schema_name(),
                "opens": opens,
                "closes": closes,
            })
        })
        .collect()
}

fn offer(service: &Service) -> Value {
    let mut offer = json!({
        "@type": "Offer",
        "price": service.price,
        "priceCurrency": "EUR",
        "availability": if service.available { "https://schema.org/InStock" } else { "https://schema.org/OutOfStock" },
    });
    if let (Some(created), Some(obj)) = (service.created_at, offer.as_object_mut()) {
        obj.insert("validFrom".into(), Value::String(created.to_rfc3339_opts(SecondsFormat::Millis, true)));
    }
    json!({
        "@type": "Service",
        "name": service.name,
        "description": service.description,
        "offers": offer,
    })
}

fn author_name(review: &Appointment) -> String {
    let d = &review.customer_details;
    match d.last_name.chars().next() {
        Some(initial) => format!("{} {}.", d.first_name, initial),
        None => d.first_name.clone(),
    }
}

fn reviews(reviews: &[Appointment]) -> Vec<Value> {
    reviews
        .iter()
        .filter_map(|r| r.feedback.as_ref().map(|f| (r, f)))
        .map(|(r, f)| {
            json!({
                "@type": "Review",
                "reviewRating": {
                    "@type": "Rating",
                    "ratingValue": f.rating,
                    "bestRating": 5,
                    "worstRating": 1,
                },
                "author": { "@type": "Person", "name": author_name(r) },
                "datePublished": f.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                "reviewBody": f.comment,
            })
        })
        .collect()
}

/// Build the LocalBusiness/CarWash document for a vendor page. `origin` is the canonical
/// site origin used for the vendor's `@id` and `url`.
pub fn vendor_structured_data(origin: &str, vendor: &Vendor, services: &[Service], review_items: &[Appointment]) -> Value {
    let page = format!("{}/vendor/{}", origin.trim_end_matches('/'), vendor.id);
    let mut doc = Map::new();
    doc.insert("@context".into(), json!("https://schema.org"));
    doc.insert("@type".into(), json!(["LocalBusiness", "CarWash"]));
    doc.insert("@id".into(), json!(page));
    doc.insert("name".into(), json!(vendor.business_name));
    put_opt(&mut doc, "description", non_empty(&vendor.description));
    doc.insert("url".into(), json!(page));
    put_opt(&mut doc, "telephone", non_empty(&vendor.phone));
    put_opt(&mut doc, "email", Some(vendor.email.as_str()).filter(|s| !s.is_empty()));
    doc.insert("priceRange".into(), json!("€€"));
    put_opt(&mut doc, "image", non_empty(&vendor.logo_image).or_else(|| non_empty(&vendor.cover_image)));

    let mut address = Map::new();
    address.insert("@type".into(), json!("PostalAddress"));
    put_opt(&mut address, "streetAddress", non_empty(&vendor.address));
    put_opt(&mut address, "addressLocality", non_empty(&vendor.city));
    put_opt(&mut address, "postalCode", non_empty(&vendor.postal_code));
    address.insert("addressCountry".into(), json!("FI"));
    doc.insert("address".into(), Value::Object(address));

    if let Some(loc) = vendor.location {
        doc.insert("geo".into(), json!({ "@type": "GeoCoordinates", "latitude": loc.lat, "longitude": loc.lng }));
    }

    let hours = opening_hours(vendor);
    if !hours.is_empty() {
        doc.insert("openingHoursSpecification".into(), Value::Array(hours));
    }

    if let (Some(rating), Some(count)) = (vendor.rating, vendor.rating_count) {
        if rating > 0.0 && count > 0 {
            doc.insert(
                "aggregateRating".into(),
                json!({ "@type": "AggregateRating", "ratingValue": rating, "ratingCount": count, "bestRating": 5, "worstRating": 1 }),
            );
        }
    }

    if !services.is_empty() {
        doc.insert(
            "hasOfferCatalog".into(),
            json!({
                "@type": "OfferCatalog",
                "name": OFFER_CATALOG_NAME,
                "itemListElement": services.iter().map(offer).collect::<Vec<_>>(),
            }),
        );
    }

    let review_docs = reviews(review_items);
    if !review_docs.is_empty() {
        doc.insert("review".into(), Value::Array(review_docs));
    }

    Value::Object(doc)
}
