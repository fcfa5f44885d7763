use chrono::{DateTime, FixedOffset, Utc};
use cms_core::{ClaimRequest, FraudReport, SuggestionBox};

const TIME_ZONE_LABEL: &str = "GMT-4 (República Dominicana)";

pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Local time in Santo Domingo, which has no daylight saving.
fn local_timestamp(at: Option<DateTime<Utc>>) -> String {
    let at = at.unwrap_or_else(Utc::now);
    match FixedOffset::west_opt(4 * 3600) {
        Some(offset) => at.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string(),
        None => at.format("%d/%m/%Y %H:%M").to_string(),
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_page(heading: &str, greeting: &str, intro: &str, details: &[(&str, String)], steps: &[&str], signature: &str) -> String {
    let rows: String = details
        .iter()
        .map(|(label, value)| format!("<li><strong>{}:</strong> {}</li>", escape(label), escape(value)))
        .collect();
    let steps: String = steps
        .iter()
        .map(|step| format!("<li>{}</li>", escape(step)))
        .collect();
    format!(
        "<!DOCTYPE html><html lang=\"es\"><body style=\"font-family: Arial, sans-serif; color: #1f2937;\">\
<h2 style=\"color: #0f4c81;\">{heading}</h2>\
<p>{greeting}</p><p>{intro}</p>\
<ul>{rows}</ul>\
<h3>Próximos pasos</h3><ul>{steps}</ul>\
<p style=\"font-size: 12px; color: #6b7280;\">Horario: {tz}</p>\
<p>Saludos cordiales,<br>{signature}</p>\
</body></html>",
        heading = escape(heading),
        greeting = escape(greeting),
        intro = escape(intro),
        tz = TIME_ZONE_LABEL,
        signature = escape(signature),
    )
}

pub fn claim_confirmation(claim: &ClaimRequest) -> RenderedEmail {
    let id = claim.meta.id;
    let date = local_timestamp(claim.meta.created_at);
    let steps = [
        "Nuestro equipo revisará su solicitud en un plazo máximo de 48 horas hábiles",
        "Recibirá una notificación cuando su solicitud sea procesada",
        "Si necesita información adicional, nos pondremos en contacto con usted",
    ];
    let intro = format!(
        "Hemos recibido su solicitud #{id} y queremos confirmarle que ha sido registrada exitosamente en nuestro sistema."
    );

    let text = format!(
        "Hola {name},\n\n\
{intro}\n\n\
Detalles de la solicitud:\n\
- Número: #{id}\n\
- Fecha: {date}\n\
- Tipo: {product}\n\
- Categoría: {claim_type}\n\n\
Próximos pasos:\n\
- {s0}\n\
- {s1}\n\
- {s2}\n\n\
Importante: Por favor, conserve este correo como comprobante de su solicitud.\n\n\
Saludos cordiales,\n\
Equipo ASOMAP",
        name = claim.full_name,
        product = claim.product_type,
        claim_type = claim.claim_type,
        s0 = steps[0],
        s1 = steps[1],
        s2 = steps[2],
    );

    let html = html_page(
        "Solicitud recibida",
        &format!("Hola {},", claim.full_name),
        &intro,
        &[
            ("Número", format!("#{id}")),
            ("Fecha", date),
            ("Tipo", claim.product_type.clone()),
            ("Categoría", claim.claim_type.clone()),
        ],
        &steps,
        "Equipo ASOMAP",
    );

    RenderedEmail {
        subject: format!("Solicitud #{id} recibida"),
        text,
        html,
    }
}

pub fn fraud_confirmation(report: &FraudReport) -> RenderedEmail {
    let id = report.meta.id;
    let date = local_timestamp(report.meta.created_at);
    let steps = [
        "Nuestro equipo de seguridad revisará su reporte en un plazo máximo de 24 horas hábiles",
        "Recibirá una notificación cuando su reporte sea procesado",
        "Si necesita información adicional, nos pondremos en contacto con usted",
    ];
    let intro = format!(
        "Hemos recibido su reporte de fraude #{id} y queremos confirmarle que ha sido registrado exitosamente en nuestro sistema."
    );

    let text = format!(
        "Hola {name},\n\n\
{intro}\n\n\
Detalles del reporte:\n\
- Número: #{id}\n\
- Fecha: {date}\n\
- Clasificación: {classification}\n\n\
Próximos pasos:\n\
- {s0}\n\
- {s1}\n\
- {s2}\n\n\
Importante: Por favor, conserve este correo como comprobante de su reporte.\n\n\
Saludos cordiales,\n\
Equipo de Seguridad ASOMAP",
        name = report.full_name,
        classification = report.classification,
        s0 = steps[0],
        s1 = steps[1],
        s2 = steps[2],
    );

    let html = html_page(
        "Reporte de fraude recibido",
        &format!("Hola {},", report.full_name),
        &intro,
        &[
            ("Número", format!("#{id}")),
            ("Fecha", date),
            ("Clasificación", report.classification.clone()),
        ],
        &steps,
        "Equipo de Seguridad ASOMAP",
    );

    RenderedEmail {
        subject: format!("Reporte de Fraude #{id} recibido"),
        text,
        html,
    }
}

pub fn suggestion_confirmation(suggestion: &SuggestionBox) -> RenderedEmail {
    let date = local_timestamp(suggestion.meta.created_at);
    let steps = [
        "Nuestro equipo revisará tu sugerencia",
        "La tendremos en cuenta para mejorar nuestros servicios",
        "Si necesitas información adicional, nos pondremos en contacto contigo",
    ];
    let intro = "Hemos recibido tu sugerencia y queremos confirmarte que ha sido registrada en nuestro sistema.";

    let text = format!(
        "Hola {name},\n\n\
{intro}\n\n\
Detalles de la sugerencia:\n\
- Clasificación: {classification}\n\
- Fecha: {date}\n\n\
Tu mensaje: {message}\n\n\
Próximos pasos:\n\
- {s0}\n\
- {s1}\n\
- {s2}\n\n\
¡Gracias por tu valioso feedback!\n\n\
Saludos cordiales,\n\
Equipo ASOMAP",
        name = suggestion.full_name,
        classification = suggestion.classification,
        message = suggestion.message,
        s0 = steps[0],
        s1 = steps[1],
        s2 = steps[2],
    );

    let html = html_page(
        "Sugerencia recibida",
        &format!("Hola {},", suggestion.full_name),
        intro,
        &[
            ("Clasificación", suggestion.classification.clone()),
            ("Fecha", date),
            ("Tu mensaje", suggestion.message.clone()),
        ],
        &steps,
        "Equipo ASOMAP",
    );

    RenderedEmail {
        subject: "Sugerencia Recibida - ASOMAP".to_string(),
        text,
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn claim_email_lists_details_in_local_time() {
        let mut claim = ClaimRequest {
            full_name: "Ana Pérez".to_string(),
            product_type: "Tarjeta de débito".to_string(),
            claim_type: "Cargo no reconocido".to_string(),
            ..Default::default()
        };
        claim.meta.id = 42;
        claim.meta.created_at = Some(Utc.with_ymd_and_hms(2024, 9, 21, 14, 30, 0).unwrap());

        let email = claim_confirmation(&claim);
        assert_eq!(email.subject, "Solicitud #42 recibida");
        assert!(email.text.starts_with("Hola Ana Pérez,"));
        assert!(email.text.contains("- Fecha: 21/09/2024 10:30"));
        assert!(email.text.contains("48 horas hábiles"));
        assert!(email.text.ends_with("Equipo ASOMAP"));
    }

    #[test]
    fn fraud_email_is_signed_by_security_team() {
        let mut report = FraudReport {
            full_name: "Luis".to_string(),
            classification: "Phishing".to_string(),
            ..Default::default()
        };
        report.meta.id = 7;
        let email = fraud_confirmation(&report);
        assert_eq!(email.subject, "Reporte de Fraude #7 recibido");
        assert!(email.text.contains("24 horas hábiles"));
        assert!(email.text.ends_with("Equipo de Seguridad ASOMAP"));
    }

    #[test]
    fn html_escapes_submitted_text() {
        let suggestion = SuggestionBox {
            full_name: "<script>".to_string(),
            message: "a & b".to_string(),
            ..Default::default()
        };
        let email = suggestion_confirmation(&suggestion);
        assert_eq!(email.subject, "Sugerencia Recibida - ASOMAP");
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(email.html.contains("a &amp; b"));
        assert!(!email.html.contains("<script>"));
    }
}
