use crate::models::{Chapter, Project};

/// System message sent with every generation request.
pub const SYSTEM_PERSONA: &str = "You are an expert romance novelist with years of experience writing bestselling novels. Your writing is engaging, emotionally resonant, and professionally polished.";

pub const TEMPERATURE: f32 = 0.8;

pub const MAX_OUTPUT_TOKENS: u32 = 4000;

const WRITING_GUIDELINES: [&str; 5] = [
    "Keep every character's voice and personality consistent",
    "Include sensory detail and emotional depth",
    "Balance dialogue with narrative",
    "End on a hook that pulls the reader into the next chapter",
    "Match the stated heat level and stay true to the genre's conventions and tropes",
];

/// Everything the instruction text is built from.
#[derive(Debug, Clone)]
pub struct PromptTemplate<'a> {
    pub project_title: &'a str,
    pub genre: &'a str,
    pub tropes: &'a [String],
    pub pov: &'a str,
    pub heat_level: &'a str,
    pub chapter_number: i32,
    pub chapter_title: Option<&'a str>,
    pub target_word_count: i32,
    pub previous_chapter_summary: Option<&'a str>,
}

impl<'a> PromptTemplate<'a> {
    pub fn new(
        project: &'a Project,
        chapter: &'a Chapter,
        previous_chapter_summary: Option<&'a str>,
    ) -> Self {
        PromptTemplate {
            project_title: &project.title,
            genre: &project.genre,
            tropes: &project.tropes,
            pov: project.pov.label(),
            heat_level: project.heat_level.to_str(),
            chapter_number: chapter.chapter_number,
            chapter_title: chapter.title.as_deref().filter(|t| !t.is_empty()),
            target_word_count: chapter.target_word_count,
            previous_chapter_summary,
        }
    }

    /// Render the user instruction for the generation call.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(1024);

        out.push_str("You are an expert romance novelist. Write Chapter ");
        out.push_str(&self.chapter_number.to_string());
        if let Some(title) = self.chapter_title {
            out.push_str(" titled \"");
            out.push_str(title);
            out.push('"');
        }
        out.push_str(" for the romance novel \"");
        out.push_str(self.project_title);
        out.push_str("\".\n\n");

        out.push_str("Genre: ");
        out.push_str(self.genre);
        out.push_str("\nTropes: ");
        out.push_str(&self.tropes.join(", "));
        out.push_str("\nPoint of View: ");
        out.push_str(self.pov);
        out.push_str("\nHeat Level: ");
        out.push_str(self.heat_level);
        out.push_str("\nTarget Word Count: ");
        out.push_str(&self.target_word_count.to_string());
        out.push_str(" words\n\nWriting Guidelines:\n");

        for (i, guideline) in WRITING_GUIDELINES.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, guideline));
        }

        if let Some(summary) = self.previous_chapter_summary {
            out.push_str("\nPrevious Chapter Summary:\n");
            out.push_str(summary);
            out.push('\n');
        }

        out.push_str("\nWrite the complete chapter now:");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template<'a>(tropes: &'a [String]) -> PromptTemplate<'a> {
        PromptTemplate {
            project_title: "Harbor Lights",
            genre: "Contemporary",
            tropes,
            pov: "third person limited",
            heat_level: "mild",
            chapter_number: 3,
            chapter_title: Some("The Storm"),
            target_word_count: 2500,
            previous_chapter_summary: None,
        }
    }

    #[test]
    fn embeds_project_and_chapter_metadata() {
        let tropes = vec!["second chance".to_string(), "small town".to_string()];
        let prompt = template(&tropes).render();

        assert!(prompt.contains("Write Chapter 3 titled \"The Storm\""));
        assert!(prompt.contains("\"Harbor Lights\""));
        assert!(prompt.contains("Genre: Contemporary"));
        assert!(prompt.contains("Tropes: second chance, small town"));
        assert!(prompt.contains("Point of View: third person limited"));
        assert!(prompt.contains("Heat Level: mild"));
        assert!(prompt.contains("Target Word Count: 2500 words"));
        assert!(prompt.ends_with("Write the complete chapter now:"));
    }

    #[test]
    fn lists_five_guidelines() {
        let tropes: Vec<String> = vec![];
        let prompt = template(&tropes).render();
        for n in 1..=5 {
            assert!(prompt.contains(&format!("\n{}. ", n)));
        }
        assert!(!prompt.contains("\n6. "));
    }

    #[test]
    fn continuity_only_when_present() {
        let tropes: Vec<String> = vec![];
        let without = template(&tropes).render();
        assert!(!without.contains("Previous Chapter Summary"));

        let mut with = template(&tropes);
        with.previous_chapter_summary = Some("They met at the pier...");
        let prompt = with.render();
        assert!(prompt.contains("Previous Chapter Summary:\nThey met at the pier..."));
    }

    #[test]
    fn untitled_chapter() {
        let tropes: Vec<String> = vec![];
        let mut t = template(&tropes);
        t.chapter_title = None;
        assert!(t.render().starts_with(
            "You are an expert romance novelist. Write Chapter 3 for the romance novel"
        ));
    }
}
