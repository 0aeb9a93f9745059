// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in activity categories and tool catalog offered in the
//! questionnaire. Ids are stable and stored verbatim in responses;
//! display names and emoji are presentation only.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub id: &'static str,
    pub name: &'static str,
    pub group: &'static str,
    pub emoji: &'static str,
}

/// Id of the catalog entry that unlocks the free-text "other tool" input.
pub const OTHER_TOOL_ID: &str = "other_tool";

pub const CATEGORIES: &[Category] = &[
    Category {
        id: "prompt_engineering",
        name: "Prompt Engineering",
        description: "Experimenting with different prompts and techniques",
        emoji: "🎯",
    },
    Category {
        id: "code_generation",
        name: "Code Generation",
        description: "Using AI to generate, review, or debug code",
        emoji: "💻",
    },
    Category {
        id: "content_creation",
        name: "Content Creation",
        description: "Creating text, images, videos, or other content with AI",
        emoji: "✍️",
    },
    Category {
        id: "data_analysis",
        name: "Data Analysis",
        description: "Analyzing data or creating visualizations with AI",
        emoji: "📊",
    },
    Category {
        id: "automation",
        name: "Automation",
        description: "Building automated workflows or processes with AI",
        emoji: "⚙️",
    },
    Category {
        id: "research",
        name: "Research & Learning",
        description: "Researching AI topics or learning new AI concepts",
        emoji: "🔬",
    },
    Category {
        id: "prototyping",
        name: "Prototyping",
        description: "Building prototypes or proof-of-concepts with AI",
        emoji: "🚀",
    },
    Category {
        id: "collaboration",
        name: "AI Collaboration",
        description: "Working with AI as a collaborative partner",
        emoji: "🤝",
    },
    Category {
        id: "other",
        name: "Other",
        description: "Other AI activities not covered above",
        emoji: "✨",
    },
];

pub const TOOLS: &[Tool] = &[
    Tool { id: "chatgpt", name: "ChatGPT", group: "general", emoji: "🤖" },
    Tool { id: "claude", name: "Claude", group: "general", emoji: "🧠" },
    Tool { id: "github_copilot", name: "GitHub Copilot", group: "coding", emoji: "👨‍💻" },
    Tool { id: "cursor", name: "Cursor", group: "coding", emoji: "⌨️" },
    Tool { id: "midjourney", name: "Midjourney", group: "image", emoji: "🎨" },
    Tool { id: "dalle", name: "DALL-E", group: "image", emoji: "🖼️" },
    Tool { id: "stable_diffusion", name: "Stable Diffusion", group: "image", emoji: "🎭" },
    Tool { id: "notion_ai", name: "Notion AI", group: "productivity", emoji: "📝" },
    Tool { id: "jupyter", name: "Jupyter + AI", group: "data", emoji: "📊" },
    Tool { id: "langchain", name: "LangChain", group: "development", emoji: "🔗" },
    Tool { id: "openai_api", name: "OpenAI API", group: "development", emoji: "🔌" },
    Tool { id: "anthropic_api", name: "Anthropic API", group: "development", emoji: "🔌" },
    Tool { id: "huggingface", name: "Hugging Face", group: "development", emoji: "🤗" },
    Tool { id: "zapier", name: "Zapier AI", group: "automation", emoji: "⚡" },
    Tool { id: "make", name: "Make (Integromat)", group: "automation", emoji: "🔧" },
    Tool { id: OTHER_TOOL_ID, name: "Other Tool", group: "other", emoji: "🛠️" },
];

pub fn category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.id == id)
}

pub fn tool_by_id(id: &str) -> Option<&'static Tool> {
    TOOLS.iter().find(|tool| tool.id == id)
}
