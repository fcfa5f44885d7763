//! Sample content for local development and demos.

use crate::error::{AppError, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use cms_core::storage::{self, Storage};
use cms_core::domain::*;
use tracing::info;

pub const DOMAINS: [&str; 10] = [
    "about",
    "home",
    "header",
    "layout",
    "news",
    "products",
    "locations",
    "user-support",
    "service",
    "guidance",
];

/// Rows inserted per domain. Domains that already hold content are skipped.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub inserted: Vec<(&'static str, usize)>,
    pub skipped: Vec<&'static str>,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.inserted.iter().map(|(_, n)| n).sum()
    }
}

struct Seeder<'a> {
    storage: &'a dyn Storage,
    count: usize,
}

impl<'a> Seeder<'a> {
    async fn put<T: Record>(&mut self, mut record: T) -> Result<i64> {
        let id = storage::save(self.storage, &mut record).await?;
        self.count += 1;
        Ok(id)
    }
}

pub async fn seed(storage: &dyn Storage, only: Option<&str>) -> Result<SeedReport> {
    let selected: Vec<&'static str> = match only {
        Some(name) => vec![DOMAINS
            .iter()
            .copied()
            .find(|d| *d == name)
            .ok_or_else(|| AppError::Config(format!("Unknown seed domain '{name}'")))?],
        None => DOMAINS.to_vec(),
    };

    let mut report = SeedReport::default();
    for domain in selected {
        if has_content(storage, domain).await? {
            info!("Skipping seed for {}: content already present", domain);
            report.skipped.push(domain);
            continue;
        }
        let mut seeder = Seeder { storage, count: 0 };
        match domain {
            "about" => seed_about(&mut seeder).await?,
            "home" => seed_home(&mut seeder).await?,
            "header" => seed_header(&mut seeder).await?,
            "layout" => seed_layout(&mut seeder).await?,
            "news" => seed_news(&mut seeder).await?,
            "products" => seed_products(&mut seeder).await?,
            "locations" => seed_locations(&mut seeder).await?,
            "user-support" => seed_user_support(&mut seeder).await?,
            "service" => seed_service(&mut seeder).await?,
            _ => seed_guidance(&mut seeder).await?,
        }
        info!("Seeded {} rows for {}", seeder.count, domain);
        report.inserted.push((domain, seeder.count));
    }
    Ok(report)
}

async fn has_content(storage: &dyn Storage, domain: &str) -> Result<bool> {
    let rows = match domain {
        "about" => storage::list::<Hero>(storage).await?.len(),
        "home" => storage::list::<SliderItem>(storage).await?.len(),
        "header" => storage::list::<Navigation>(storage).await?.len(),
        "layout" => storage::list::<Footer>(storage).await?.len(),
        "news" => storage::list::<News>(storage).await?.len(),
        "products" => storage::list::<Account>(storage).await?.len(),
        "locations" => storage::list::<Location>(storage).await?.len(),
        "user-support" => storage::list::<Province>(storage).await?.len(),
        "service" => storage::list::<ServicesPage>(storage).await?.len(),
        _ => storage::list::<FaqItem>(storage).await?.len(),
    };
    Ok(rows > 0)
}

fn s(value: &str) -> String {
    value.to_string()
}

async fn seed_about(seeder: &mut Seeder<'_>) -> Result<()> {
    seeder
        .put(Hero {
            title: s("Sobre Nosotros"),
            description: s("Más de 50 años acompañando a las familias de la región."),
            ..Default::default()
        })
        .await?;
    seeder
        .put(QuienesSomos {
            title: s("Quiénes Somos"),
            paragraphs: s("ASOMAP es una asociación de ahorros y préstamos.\n\nNuestra sede está en San Francisco de Macorís."),
            image_src: s("about/quienes-somos.jpg"),
            image_alt: s("Oficina principal"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(NuestraHistoria {
            title: s("Nuestra Historia"),
            paragraphs: s("Fundada en 1966 por un grupo de comerciantes locales.\n\nHoy servimos a miles de asociados."),
            image_src: s("about/historia.jpg"),
            image_alt: s("Fundadores"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(Mision {
            title: s("Misión"),
            description: s("Ofrecer soluciones financieras accesibles que impulsen el desarrollo de nuestros asociados."),
            ..Default::default()
        })
        .await?;
    seeder
        .put(Vision {
            title: s("Visión"),
            description: s("Ser la entidad financiera de referencia en la región nordeste."),
            ..Default::default()
        })
        .await?;
    for (title, description) in [
        ("Integridad", "Actuamos con honestidad y transparencia."),
        ("Compromiso", "Servimos a la comunidad que nos vio nacer."),
        ("Innovación", "Buscamos mejores maneras de servir."),
    ] {
        seeder
            .put(Valor {
                title: s(title),
                description: s(description),
                ..Default::default()
            })
            .await?;
    }
    for (name, position) in [("María Rodríguez", "Presidenta"), ("José Almonte", "Secretario")] {
        seeder
            .put(Director {
                name: s(name),
                position: s(position),
                ..Default::default()
            })
            .await?;
    }

    let education = seeder
        .put(CommunityCategory {
            name: s("Educación"),
            icon: s("book"),
            description: s("Becas y apoyo escolar"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(CommunityInitiative {
            title: s("Útiles para todos"),
            description: s("Entrega de mochilas y útiles escolares."),
            impact: s("1,200 estudiantes beneficiados"),
            category_id: Some(education),
            year: Some(2024),
            location: s("Provincia Duarte"),
            beneficiaries: s("1200"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(CommunitySupport {
            title: s("Apoyo Comunitario"),
            description: s("Invertimos en la gente de nuestra comunidad."),
            ..Default::default()
        })
        .await?;

    seeder.put(FinancialStatementsConfig::default()).await?;
    seeder
        .put(FinancialDocument {
            title: s("Estados Financieros Auditados 2023"),
            file: s("financial/auditados-2023.pdf"),
            document_type: FinancialDocumentType::Audited,
            year: Some(s("2023")),
            ..Default::default()
        })
        .await?;
    seeder
        .put(FinancialDocument {
            title: s("Estados Trimestrales Q1 2024"),
            file: s("financial/q1-2024.pdf"),
            document_type: FinancialDocumentType::Quarterly,
            quarter: Some(s("Q1")),
            year: Some(s("2024")),
            ..Default::default()
        })
        .await?;
    seeder.put(MemoryConfig::default()).await?;
    seeder
        .put(MemoryDocument {
            file: s("memories/memoria-2023.pdf"),
            year: Some(s("2023")),
            ..Default::default()
        })
        .await?;

    seeder.put(PolicyConfig::default()).await?;
    let privacy = seeder
        .put(PolicyDocument {
            title: s("Política de Privacidad"),
            description: s("Cómo tratamos tus datos personales."),
            file: s("policies/privacidad.pdf"),
            last_update: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        })
        .await?;
    seeder
        .put(PolicyCategory {
            title: s("Cumplimiento"),
            icon: s("shield"),
            description: s("Normas y regulaciones"),
            document_ids: vec![privacy],
            ..Default::default()
        })
        .await?;
    Ok(())
}

async fn seed_home(seeder: &mut Seeder<'_>) -> Result<()> {
    seeder
        .put(DebitCardPromo {
            title: s("Tu tarjeta de débito"),
            highlighted_title: s("sin costo"),
            description: s("Solicítala hoy y úsala en todo el país."),
            primary_button_text: s("Solicitar"),
            secondary_button_text: s("Más información"),
            image: s("home/debito.png"),
            image_alt: s("Tarjeta de débito ASOMAP"),
            ..Default::default()
        })
        .await?;

    let mut items = Vec::new();
    for (order, description) in [(1, "Aprende a ahorrar"), (2, "Planifica tu presupuesto")] {
        items.push(
            seeder
                .put(EducationItem {
                    image: format!("home/educacion-{order}.png"),
                    alt: s(description),
                    description: s(description),
                    order,
                    ..Default::default()
                })
                .await?,
        );
    }
    seeder
        .put(EducationSection {
            title: s("Educación Financiera"),
            subtitle: s("Herramientas para tus finanzas"),
            education_item_ids: items,
            footer_text: s("Conoce más en nuestras sucursales"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(PeKeAccountSummary {
            title: s("Cuenta PeKe"),
            description: s("La cuenta de ahorro para los más pequeños."),
            button_text: s("Abrir cuenta"),
            image: s("home/peke.png"),
            image_alt: s("Niños ahorrando"),
            ..Default::default()
        })
        .await?;

    let mut products = Vec::new();
    for (order, (title, category)) in [
        ("Cuentas de Ahorro", ProductCategory::Cuentas),
        ("Préstamos", ProductCategory::Prestamos),
        ("Certificados", ProductCategory::Certificados),
    ]
    .into_iter()
    .enumerate()
    {
        products.push(
            seeder
                .put(Product {
                    title: s(title),
                    description: format!("Conoce nuestros {}", title.to_lowercase()),
                    category,
                    order: order as u32,
                    ..Default::default()
                })
                .await?,
        );
    }
    seeder
        .put(ProductSection {
            title: s("Nuestros Productos"),
            subtitle: s("Soluciones para cada etapa"),
            button_text: s("Ver más"),
            product_ids: products,
            ..Default::default()
        })
        .await?;
    for order in 1..=2 {
        seeder
            .put(SliderItem {
                image_desktop: format!("slider/desktop-{order}.jpg"),
                image_tablet: format!("slider/tablet-{order}.jpg"),
                image_mobile: format!("slider/mobile-{order}.jpg"),
                alt: format!("Promoción {order}"),
                order,
                ..Default::default()
            })
            .await?;
    }
    Ok(())
}

async fn seed_header(seeder: &mut Seeder<'_>) -> Result<()> {
    seeder
        .put(Navigation {
            navigation_type: NavigationType::Individual,
            menu_items: s("Cuentas, Préstamos, Tarjetas, Certificados"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(Navigation {
            navigation_type: NavigationType::Empresarial,
            menu_items: s("Cuentas Empresariales, Financiamiento"),
            ..Default::default()
        })
        .await?;
    seeder.put(ExchangeRate::default()).await?;
    Ok(())
}

async fn seed_layout(seeder: &mut Seeder<'_>) -> Result<()> {
    seeder
        .put(Footer {
            sections: s("Productos, Servicios, Nosotros, Contacto"),
            company_name: s("ASOMAP"),
            company_description: s("Asociación Mocana de Ahorros y Préstamos"),
            company_phone: s("809-578-2323"),
            company_email: s("info@asomap.com.do"),
            location_address: s("Calle Castillo #2"),
            location_city: s("San Francisco de Macorís"),
            location_country: s("República Dominicana"),
            ..Default::default()
        })
        .await?;
    Ok(())
}

async fn seed_news(seeder: &mut Seeder<'_>) -> Result<()> {
    seeder
        .put(News {
            title: s("Inauguramos nueva sucursal"),
            description: s("Abrimos nuestras puertas en Nagua."),
            author: s("Comunicaciones"),
            category: s("Institucional"),
            tags: s("sucursal, expansión"),
            fecha_publicacion: Some(Utc::now()),
            full_content: s("<h2>Nueva sucursal</h2><p>Te esperamos en Nagua.</p><ul><li>Caja</li><li>Servicio al cliente</li></ul>"),
            media: vec![NewsMedia {
                file: s("news/nagua.jpg"),
                caption: s("Corte de cinta"),
                ..Default::default()
            }],
            ..Default::default()
        })
        .await?;
    seeder
        .put(Promotion {
            title: s("Préstamos de temporada"),
            description: s("Tasa preferencial por tiempo limitado."),
            category: s("Préstamos"),
            tags: s("préstamos, tasa"),
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 9, 1),
            fecha_fin: NaiveDate::from_ymd_opt(2024, 12, 31),
            full_content: s("<p>Aprovecha nuestra tasa especial.</p>"),
            terms: s("Sujeto a aprobación, Aplican condiciones"),
            ..Default::default()
        })
        .await?;
    Ok(())
}

async fn seed_products(seeder: &mut Seeder<'_>) -> Result<()> {
    seeder
        .put(Account {
            title: s("Cuenta de Ahorro"),
            description: s("Ahorra con la mejor tasa."),
            category: AccountCategory::Savings,
            features: s("Sin comisión de manejo, Tarjeta de débito"),
            requirements: s("Cédula de identidad, Depósito inicial"),
            benefits: vec![IconBenefit {
                icon: s("piggy-bank"),
                text: s("Intereses mensuales"),
            }],
            ..Default::default()
        })
        .await?;
    seeder
        .put(Loan {
            title: s("Préstamo Hipotecario"),
            description: s("Financia tu vivienda."),
            loan_type: LoanKind::HomePurchase,
            details: s("Hasta 20 años, Tasa competitiva"),
            requirements: s("Cédula, Carta de trabajo, Tasación"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(Card {
            title: s("Tarjeta de Débito"),
            description: s("Accede a tu dinero cuando lo necesites."),
            card_type: CardType::Debit,
            features: s("Compras en línea, Retiros en cajeros"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(Certificate {
            title: s("Certificado Financiero"),
            subtitle: s("Haz crecer tu dinero"),
            description: s("Inversión a plazo fijo."),
            benefits: vec![CertificateBenefit {
                title: s("Rentabilidad"),
                description: s("Tasas competitivas"),
            }],
            investment_details: s("Monto mínimo RD$10,000, Plazo desde 30 días"),
            rates: vec![CertificateRate {
                label: s("Tasa anual"),
                value: s("8.5%"),
            }],
            deposit_rates: vec![DepositRate {
                range: s("RD$10,000 - RD$499,999"),
                rate: s("7.5%"),
                term: s("90 días"),
            }],
            faq: vec![CertificateFaq {
                question: s("¿Puedo cancelar antes?"),
                answer: s("Sí, con penalidad."),
            }],
            ..Default::default()
        })
        .await?;
    seeder
        .put(Banner {
            title: s("Tu futuro empieza hoy"),
            description: s("Abre tu cuenta en minutos."),
            button1_name: s("Abrir cuenta"),
            button1_url: s("/productos/cuentas"),
            order: 1,
            ..Default::default()
        })
        .await?;
    for (order, name) in [(1, "Hipotecario"), (2, "Consumo")] {
        seeder
            .put(LoanType {
                name: s(name),
                description: format!("Préstamo {}", name.to_lowercase()),
                order,
                ..Default::default()
            })
            .await?;
    }
    Ok(())
}

async fn seed_locations(seeder: &mut Seeder<'_>) -> Result<()> {
    let office = seeder
        .put(Schedule {
            name: s("Horario de oficina"),
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            ..Default::default()
        })
        .await?;
    let always = seeder
        .put(Schedule {
            name: s("24 horas"),
            is_24_7: true,
            ..Default::default()
        })
        .await?;
    let deposits = seeder
        .put(Service {
            name: s("Depósitos"),
            description: s("Depósitos en efectivo y cheques"),
            ..Default::default()
        })
        .await?;
    let loans = seeder
        .put(Service {
            name: s("Préstamos"),
            description: s("Solicitud y pago de préstamos"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(Location {
            location_type: LocationType::Branch,
            name: s("Oficina Principal"),
            address: s("Calle Castillo #2, San Francisco de Macorís"),
            phone: s("809-578-2323"),
            latitude: s("19.3009"),
            longitude: s("-70.2526"),
            schedule_id: Some(office),
            service_ids: vec![deposits, loans],
            is_open: true,
            ..Default::default()
        })
        .await?;
    seeder
        .put(Location {
            location_type: LocationType::Atm,
            name: s("Cajero Plaza Central"),
            address: s("Plaza Central, San Francisco de Macorís"),
            latitude: s("19.2950"),
            longitude: s("-70.2510"),
            schedule_id: Some(always),
            is_open: true,
            ..Default::default()
        })
        .await?;
    Ok(())
}

async fn seed_user_support(seeder: &mut Seeder<'_>) -> Result<()> {
    for name in ["Duarte", "María Trinidad Sánchez", "Santiago", "Santo Domingo"] {
        seeder
            .put(Province {
                name: s(name),
                ..Default::default()
            })
            .await?;
    }

    let savings = seeder
        .put(AccountType {
            label: s("Cuentas de Ahorro"),
            description: s("Cuentas de ahorro sin movimiento"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(AbandonedAccountsSection {
            title: s("Cuentas Abandonadas e Inactivas"),
            description: s("Listados publicados según la normativa vigente."),
            account_type_ids: vec![savings],
            ..Default::default()
        })
        .await?;
    seeder
        .put(YearlyDocument {
            year: s("2024"),
            account_type_id: Some(savings),
            document_type: YearlyDocumentType::Abandoned,
            title: s("Listado de cuentas abandonadas 2024"),
            document: s("yearly/abandonadas-2024.pdf"),
            date: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..Default::default()
        })
        .await?;

    let contracts = seeder
        .put(ContractCategory {
            name: s("Cuentas"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(AccountContractsSection {
            title: s("Contratos de Adhesión"),
            description: s("Consulta los contratos de nuestros productos."),
            ..Default::default()
        })
        .await?;
    seeder
        .put(Contract {
            title: s("Contrato de Cuenta de Ahorro"),
            category_id: Some(contracts),
            document: s("contracts/ahorro.pdf"),
            order: 1,
            ..Default::default()
        })
        .await?;

    seeder
        .put(ServiceRatesPage {
            title: s("Tarifario de Servicios"),
            description: s("Cargos vigentes por servicio."),
            ..Default::default()
        })
        .await?;
    let accounts = seeder
        .put(ServiceCategory {
            name: s("Cuentas"),
            order: 1,
            ..Default::default()
        })
        .await?;
    seeder
        .put(ServiceRate {
            category_id: Some(accounts),
            service: s("Reposición de libreta"),
            description: s("Por extravío o deterioro"),
            rate: s("RD$150.00"),
            order: 1,
            ..Default::default()
        })
        .await?;

    seeder
        .put(RightsAndDutiesPage {
            page_title: s("Derechos y Deberes"),
            page_description: s("Conoce tus derechos como usuario financiero."),
            ..Default::default()
        })
        .await?;
    let rights = seeder
        .put(RightsAndDutiesSection {
            section_id: RightsSectionId::RightsAndDuties,
            title: s("Tus derechos"),
            description: s("Recibir información clara y oportuna."),
            button_text: s("Ver más"),
            ..Default::default()
        })
        .await?;
    seeder
        .put(RightsAndDutiesImage {
            section_record_id: Some(rights),
            image: s("rights/derechos.png"),
            alt_text: s("Infografía de derechos"),
            ..Default::default()
        })
        .await?;

    seeder
        .put(SuggestionBoxPage {
            title: s("Buzón de Sugerencias"),
            description: s("Tu opinión nos ayuda a mejorar."),
            ..Default::default()
        })
        .await?;
    seeder
        .put(FraudReportPage {
            title: s("Reporte de Fraude"),
            description: s("Reporta cualquier actividad sospechosa."),
            ..Default::default()
        })
        .await?;
    seeder
        .put(ClaimRequestPage {
            title: s("Solicitud de Reclamación"),
            description: s("Presenta tu reclamación de forma sencilla."),
            ..Default::default()
        })
        .await?;
    Ok(())
}

async fn seed_service(seeder: &mut Seeder<'_>) -> Result<()> {
    let page = seeder
        .put(ServicesPage {
            title: s("Servicios"),
            subtitle: s("Todo lo que necesitas en un solo lugar"),
            internet_banking_url: s("https://banca.asomap.com.do"),
            ..Default::default()
        })
        .await?;
    for (order, title) in [(1, "Transferencias"), (2, "Pago de servicios")] {
        seeder
            .put(ServiceInfo {
                services_page_id: Some(page),
                title: s(title),
                description: format!("{title} desde cualquier lugar"),
                steps: s("<ol><li>Ingresa a la banca en línea</li><li>Sigue las instrucciones</li></ol>"),
                order,
                ..Default::default()
            })
            .await?;
    }
    Ok(())
}

async fn seed_guidance(seeder: &mut Seeder<'_>) -> Result<()> {
    seeder
        .put(SavingTip {
            title: s("Págate primero"),
            description: s("Separa tu ahorro antes de gastar."),
            content: s("<p>Destina al menos un 10% de tus ingresos al ahorro.</p>"),
            order: 1,
            ..Default::default()
        })
        .await?;
    seeder
        .put(SliderSlide {
            image_url: s("guidance/slide-1.jpg"),
            title: s("Educación financiera"),
            description: s("Aprende a administrar tu dinero"),
            order: 1,
            ..Default::default()
        })
        .await?;
    seeder
        .put(FaqItem {
            question: s("¿Qué es un certificado financiero?"),
            answer: s("Un instrumento de ahorro a plazo fijo."),
            order: 1,
            ..Default::default()
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cms_core::storage::InMemoryStorage;

    #[tokio::test]
    async fn seeds_every_domain_once() {
        let storage = InMemoryStorage::new();
        let report = seed(&storage, None).await.unwrap();
        assert_eq!(report.inserted.len(), DOMAINS.len());
        assert!(report.total() > 50);

        let again = seed(&storage, None).await.unwrap();
        assert_eq!(again.total(), 0);
        assert_eq!(again.skipped.len(), DOMAINS.len());
    }

    #[tokio::test]
    async fn single_domain_and_unknown_domain() {
        let storage = InMemoryStorage::new();
        let report = seed(&storage, Some("header")).await.unwrap();
        assert_eq!(report.inserted, vec![("header", 3)]);
        assert!(storage::first_active::<ExchangeRate>(&storage).await.unwrap().is_some());
        assert!(seed(&storage, Some("weather")).await.is_err());
    }
}
