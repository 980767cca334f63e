use crate::error::AnalysisError;
use crate::models::{group_label, GroupCount, GroupStats, Summary, SummaryFacts};

const ADVICE: &[&str] = &[
    "La distribution montre que certaines garanties dominent fortement, ce qui peut indiquer une concentration de demandes ou de ventes spécifiques.",
    "Si les garanties peu représentées sont stratégiquement importantes, il serait utile d'examiner les causes possibles (mauvaise communication, faible demande, etc.).",
    "Les garanties les plus fréquentes peuvent refléter la **préférence client** ou la **performance des produits** associés.",
    "En combinant avec une colonne numérique (par ex. montant, coût, durée), on peut dégager des **corrélations entre la garantie et la valeur économique**.",
];

const TIP: &str = "💡 Conseil : Vous pouvez exporter ce tableau et ces graphiques pour vos rapports internes.";

/// Largest and smallest groups by `Nombre` (first row wins ties), total and
/// mean count per group.
pub fn summary_facts(rows: &[GroupStats]) -> Result<SummaryFacts, AnalysisError> {
    let first = rows.first().ok_or(AnalysisError::EmptyInput)?;

    let mut max_row = first;
    let mut min_row = first;
    for row in &rows[1..] {
        if row.count > max_row.count {
            max_row = row;
        }
        if row.count < min_row.count {
            min_row = row;
        }
    }

    let total: usize = rows.iter().map(|r| r.count).sum();

    Ok(SummaryFacts {
        max_group: GroupCount { garantie: max_row.garantie.clone(), count: max_row.count },
        min_group: GroupCount { garantie: min_row.garantie.clone(), count: min_row.count },
        total,
        average: total as f64 / rows.len() as f64,
    })
}

pub fn render_narrative(facts: &SummaryFacts) -> String {
    let advice: String = ADVICE.iter().map(|line| format!("- {}\n", line)).collect();

    format!(
        "### 📘 Synthèse des résultats\n\
         - 🔝 **Garantie la plus représentée :** `{}` avec **{} enregistrements**.\n\
         - ⚠️ **Garantie la moins représentée :** `{}` avec **{} enregistrements**.\n\
         - 📦 **Total d'enregistrements analysés :** {}.\n\
         - 📊 **Nombre moyen par garantie :** {:.2}.\n\
         \n\
         ### 💬 Analyse détaillée\n\
         {}\n\
         {}",
        group_label(facts.max_group.garantie.as_deref()),
        facts.max_group.count,
        group_label(facts.min_group.garantie.as_deref()),
        facts.min_group.count,
        facts.total,
        facts.average,
        advice,
        TIP
    )
}

pub fn summarize(rows: &[GroupStats]) -> Result<Summary, AnalysisError> {
    let facts = summary_facts(rows)?;
    let narrative = render_narrative(&facts);
    Ok(Summary { facts, narrative })
}
