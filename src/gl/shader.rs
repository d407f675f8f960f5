//! Shader stage compilation and program linking.
//!
//! Stage sources are GLSL ES 1.0 style text. The compiler validates the
//! top-level structure (precision statements, `attribute`/`uniform`/`varying`
//! declarations, function definitions with balanced bodies) and records the
//! declared interface. Function bodies are opaque.
//!
//! The per-vertex and per-fragment math runs in a [`ShaderKernel`]. Linking
//! checks that the two stages agree with each other and that every input the
//! kernel reads is declared by the sources, then assigns locations.

use std::fmt;

use crate::error::ShaderError;
use crate::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::{FragmentShader, Varyings};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Types accepted in interface declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl GlslType {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "float" => Some(Self::Float),
            "vec2" => Some(Self::Vec2),
            "vec3" => Some(Self::Vec3),
            "vec4" => Some(Self::Vec4),
            "mat4" => Some(Self::Mat4),
            _ => None,
        }
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GlslType::Float => "float",
            GlslType::Vec2 => "vec2",
            GlslType::Vec3 => "vec3",
            GlslType::Vec4 => "vec4",
            GlslType::Mat4 => "mat4",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Qualifier {
    Attribute,
    Uniform,
    Varying,
}

impl Qualifier {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "attribute" => Some(Self::Attribute),
            "uniform" => Some(Self::Uniform),
            "varying" => Some(Self::Varying),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub qualifier: Qualifier,
    pub ty: GlslType,
    pub name: String,
    pub line: usize,
}

/// The declared interface of one successfully compiled stage.
#[derive(Clone, Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    declarations: Vec<Declaration>,
    has_main: bool,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    fn declared(&self, qualifier: Qualifier) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(move |d| d.qualifier == qualifier)
    }

    fn find(&self, qualifier: Qualifier, name: &str) -> Option<&Declaration> {
        self.declared(qualifier).find(|d| d.name == name)
    }
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Punct(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::Number(s) => f.write_str(s),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

struct Lexed {
    token: Token,
    line: usize,
}

const PUNCTUATION: &str = "(){}[];,=+-*/<>!&|.?:^%";

fn diagnostic(line: usize, token: &str, message: &str) -> String {
    format!("ERROR: 0:{line}: '{token}' : {message}")
}

/// Replaces comments with spaces, keeping newlines so line numbers survive.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        let lookahead = chars.peek().copied();
        match (c, lookahead) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn tokenize(source: &str) -> Result<Vec<Lexed>, String> {
    let stripped = strip_comments(source);
    let mut tokens = Vec::new();

    for (index, line) in stripped.lines().enumerate() {
        let line_no = index + 1;
        if line.trim_start().starts_with('#') {
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
            } else if c.is_ascii_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(Lexed { token: Token::Ident(word), line: line_no });
            } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                let number: String = chars[start..i].iter().collect();
                tokens.push(Lexed { token: Token::Number(number), line: line_no });
            } else if PUNCTUATION.contains(c) {
                tokens.push(Lexed { token: Token::Punct(c), line: line_no });
                i += 1;
            } else {
                return Err(diagnostic(line_no, &c.to_string(), "invalid character"));
            }
        }
    }
    Ok(tokens)
}

// =============================================================================
// Compiler
// =============================================================================

struct Parser<'a> {
    tokens: &'a [Lexed],
    pos: usize,
    stage: ShaderStage,
    last_line: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Lexed> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&'a Lexed, String> {
        let lexed = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| diagnostic(self.last_line, "", "unexpected end of file"))?;
        self.pos += 1;
        Ok(lexed)
    }

    fn expect_punct(&mut self, expected: char) -> Result<(), String> {
        let lexed = self.next()?;
        match lexed.token {
            Token::Punct(c) if c == expected => Ok(()),
            ref other => Err(diagnostic(lexed.line, &other.to_string(), &format!("expected '{expected}'"))),
        }
    }

    fn expect_ident(&mut self) -> Result<(&'a str, usize), String> {
        let lexed = self.next()?;
        match &lexed.token {
            Token::Ident(word) => Ok((word.as_str(), lexed.line)),
            other => Err(diagnostic(lexed.line, &other.to_string(), "syntax error")),
        }
    }

    fn expect_type(&mut self) -> Result<GlslType, String> {
        let (word, line) = self.expect_ident()?;
        GlslType::parse(word).ok_or_else(|| diagnostic(line, word, "unsupported type"))
    }

    fn skip_precision_word(&mut self) {
        if let Some(Lexed { token: Token::Ident(word), .. }) = self.peek() {
            if matches!(word.as_str(), "lowp" | "mediump" | "highp") {
                self.pos += 1;
            }
        }
    }

    /// `precision <qualifier> <type>;`
    fn precision(&mut self) -> Result<(), String> {
        let (word, line) = self.expect_ident()?;
        if !matches!(word, "lowp" | "mediump" | "highp") {
            return Err(diagnostic(line, word, "expected precision qualifier"));
        }
        self.expect_ident()?;
        self.expect_punct(';')
    }

    fn declaration(&mut self, qualifier: Qualifier, line: usize) -> Result<Declaration, String> {
        if qualifier == Qualifier::Attribute && self.stage != ShaderStage::Vertex {
            return Err(diagnostic(line, "attribute", "supported in vertex shaders only"));
        }
        self.skip_precision_word();
        let ty = self.expect_type()?;
        let (name, name_line) = self.expect_ident()?;
        self.expect_punct(';')?;
        Ok(Declaration {
            qualifier,
            ty,
            name: name.to_string(),
            line: name_line,
        })
    }

    /// Skips a parenthesized parameter list and a braced body.
    fn function(&mut self) -> Result<(), String> {
        self.expect_punct('(')?;
        let mut depth = 1;
        while depth > 0 {
            match self.next()?.token {
                Token::Punct('(') => depth += 1,
                Token::Punct(')') => depth -= 1,
                _ => {}
            }
        }
        self.expect_punct('{')?;
        let mut depth = 1;
        while depth > 0 {
            match self.next()?.token {
                Token::Punct('{') => depth += 1,
                Token::Punct('}') => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn skip_statement(&mut self) -> Result<(), String> {
        while self.next()?.token != Token::Punct(';') {}
        Ok(())
    }
}

/// Compiles one stage, returning its declared interface or a diagnostic log.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, ShaderError> {
    let fail = |log: String| ShaderError::Compile { stage, log };

    let tokens = tokenize(source).map_err(fail)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        stage,
        last_line: source.lines().count().max(1),
    };
    let mut declarations: Vec<Declaration> = Vec::new();
    let mut has_main = false;

    while let Some(lexed) = parser.peek() {
        parser.pos += 1;
        let word = match &lexed.token {
            Token::Ident(word) => word.as_str(),
            other => return Err(fail(diagnostic(lexed.line, &other.to_string(), "syntax error"))),
        };

        if word == "precision" {
            parser.precision().map_err(fail)?;
        } else if word == "const" {
            parser.skip_statement().map_err(fail)?;
        } else if let Some(qualifier) = Qualifier::parse(word) {
            let declaration = parser.declaration(qualifier, lexed.line).map_err(fail)?;
            if declarations.iter().any(|d| d.name == declaration.name) {
                return Err(fail(diagnostic(declaration.line, &declaration.name, "redefinition")));
            }
            declarations.push(declaration);
        } else if word == "void" || GlslType::parse(word).is_some() {
            let (name, _) = parser.expect_ident().map_err(fail)?;
            parser.function().map_err(fail)?;
            if word == "void" && name == "main" {
                has_main = true;
            }
        } else {
            return Err(fail(diagnostic(lexed.line, word, "syntax error")));
        }
    }

    Ok(CompiledShader {
        stage,
        declarations,
        has_main,
    })
}

// =============================================================================
// Kernels and uniform values
// =============================================================================

/// Current value of a uniform. Unset uniforms read as zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn zero(ty: GlslType) -> Self {
        match ty {
            GlslType::Float => Self::Float(0.0),
            GlslType::Vec2 => Self::Vec2(Vec2::ZERO),
            GlslType::Vec3 => Self::Vec3(Vec3::ZERO),
            GlslType::Vec4 => Self::Vec4(Vec4::new(0.0, 0.0, 0.0, 0.0)),
            GlslType::Mat4 => Self::Mat4(Mat4::new([[0.0; 4]; 4])),
        }
    }

    pub fn ty(&self) -> GlslType {
        match self {
            Self::Float(_) => GlslType::Float,
            Self::Vec2(_) => GlslType::Vec2,
            Self::Vec3(_) => GlslType::Vec3,
            Self::Vec4(_) => GlslType::Vec4,
            Self::Mat4(_) => GlslType::Mat4,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match self {
            Self::Float(v) => *v,
            _ => 0.0,
        }
    }

    pub fn as_vec3(&self) -> Vec3 {
        match self {
            Self::Vec3(v) => *v,
            _ => Vec3::ZERO,
        }
    }

    pub fn as_vec4(&self) -> Vec4 {
        match self {
            Self::Vec4(v) => *v,
            _ => Vec4::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    pub fn as_mat4(&self) -> Mat4 {
        match self {
            Self::Mat4(m) => *m,
            _ => Mat4::new([[0.0; 4]; 4]),
        }
    }
}

/// The executable half of a program.
///
/// `attributes` and `uniforms` list the inputs the kernel reads. At draw
/// time the device resolves them in exactly that order.
pub trait ShaderKernel {
    fn attributes(&self) -> &'static [(&'static str, GlslType)];

    fn uniforms(&self) -> &'static [(&'static str, GlslType)];

    /// Prepares per-draw state from the current uniform values.
    fn begin_draw<'a>(&'a self, uniforms: &[UniformValue]) -> Box<dyn DrawKernel + 'a>;
}

/// Per-draw kernel state: runs the vertex stage and shades fragments.
pub trait DrawKernel: FragmentShader {
    /// Returns the clip-space position and the varyings for one vertex.
    fn vertex(&self, attributes: &[Vec4]) -> (Vec4, Varyings);
}

// =============================================================================
// Linker
// =============================================================================

/// A linked program: the merged interface with assigned locations.
pub struct LinkedProgram {
    attributes: Vec<(String, GlslType)>,
    uniforms: Vec<(String, GlslType)>,
    kernel: Box<dyn ShaderKernel>,
    kernel_attribute_slots: Vec<usize>,
    kernel_uniform_slots: Vec<usize>,
}

impl fmt::Debug for LinkedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedProgram")
            .field("attributes", &self.attributes)
            .field("uniforms", &self.uniforms)
            .finish_non_exhaustive()
    }
}

impl LinkedProgram {
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|(n, _)| n == name)
    }

    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|(n, _)| n == name)
    }

    pub fn uniform_types(&self) -> impl Iterator<Item = GlslType> + '_ {
        self.uniforms.iter().map(|(_, ty)| *ty)
    }

    pub fn kernel(&self) -> &dyn ShaderKernel {
        self.kernel.as_ref()
    }

    /// Attribute locations the kernel reads, in kernel order.
    pub fn kernel_attribute_slots(&self) -> &[usize] {
        &self.kernel_attribute_slots
    }

    /// Uniform locations the kernel reads, in kernel order.
    pub fn kernel_uniform_slots(&self) -> &[usize] {
        &self.kernel_uniform_slots
    }
}

/// Links a vertex and a fragment stage with the kernel that executes them.
pub fn link(
    vertex: &CompiledShader,
    fragment: &CompiledShader,
    kernel: Box<dyn ShaderKernel>,
) -> Result<LinkedProgram, ShaderError> {
    let fail = |msg: String| Err(ShaderError::Link(msg));

    if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
        return fail("expected one vertex and one fragment shader".to_string());
    }
    for shader in [vertex, fragment] {
        if !shader.has_main {
            return fail(format!("Missing main() in {} shader", shader.stage()));
        }
    }

    for varying in fragment.declared(Qualifier::Varying) {
        match vertex.find(Qualifier::Varying, &varying.name) {
            None => {
                return fail(format!(
                    "Varying '{}' is not declared in the vertex shader",
                    varying.name
                ))
            }
            Some(v) if v.ty != varying.ty => {
                return fail(format!("Varying '{}' has mismatched types", varying.name))
            }
            Some(_) => {}
        }
    }

    let attributes: Vec<(String, GlslType)> = vertex
        .declared(Qualifier::Attribute)
        .map(|d| (d.name.clone(), d.ty))
        .collect();

    let mut uniforms: Vec<(String, GlslType)> = Vec::new();
    for declaration in vertex
        .declared(Qualifier::Uniform)
        .chain(fragment.declared(Qualifier::Uniform))
    {
        match uniforms.iter().find(|(name, _)| *name == declaration.name) {
            Some((_, ty)) if *ty != declaration.ty => {
                return fail(format!("Uniform '{}' has mismatched types", declaration.name))
            }
            Some(_) => {}
            None => uniforms.push((declaration.name.clone(), declaration.ty)),
        }
    }

    let resolve = |table: &[(String, GlslType)], kind: &str, name: &str, ty: GlslType| {
        table
            .iter()
            .position(|(n, t)| n == name && *t == ty)
            .ok_or_else(|| {
                ShaderError::Link(format!("Kernel input '{name}' ({ty}) is not declared as {kind}"))
            })
    };

    let kernel_attribute_slots = kernel
        .attributes()
        .iter()
        .map(|&(name, ty)| resolve(attributes.as_slice(), "an attribute", name, ty))
        .collect::<Result<Vec<_>, _>>()?;
    let kernel_uniform_slots = kernel
        .uniforms()
        .iter()
        .map(|&(name, ty)| resolve(uniforms.as_slice(), "a uniform", name, ty))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LinkedProgram {
        attributes,
        uniforms,
        kernel,
        kernel_attribute_slots,
        kernel_uniform_slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "
        // position only
        attribute vec3 vertex;
        uniform mat4 ModelViewProjectionMatrix;
        varying vec3 vPos;
        void main() {
            vPos = vertex;
            gl_Position = ModelViewProjectionMatrix * vec4(vertex, 1.0);
        }
    ";

    const FRAGMENT: &str = "
        #ifdef GL_FRAGMENT_PRECISION_HIGH
        precision highp float;
        #endif
        /* block
           comment */
        uniform vec4 color;
        varying vec3 vPos;
        void main() { gl_FragColor = color; }
    ";

    struct Passthrough;

    struct PassthroughDraw;

    impl FragmentShader for PassthroughDraw {
        fn shade(&self, _varyings: &Varyings) -> u32 {
            0
        }
    }

    impl DrawKernel for PassthroughDraw {
        fn vertex(&self, attributes: &[Vec4]) -> (Vec4, Varyings) {
            (attributes[0], Varyings::default())
        }
    }

    impl ShaderKernel for Passthrough {
        fn attributes(&self) -> &'static [(&'static str, GlslType)] {
            &[("vertex", GlslType::Vec3)]
        }

        fn uniforms(&self) -> &'static [(&'static str, GlslType)] {
            &[("color", GlslType::Vec4)]
        }

        fn begin_draw<'a>(&'a self, _uniforms: &[UniformValue]) -> Box<dyn DrawKernel + 'a> {
            Box::new(PassthroughDraw)
        }
    }

    #[test]
    fn compiles_declarations_in_order() {
        let shader = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let names: Vec<_> = shader.declarations().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["vertex", "ModelViewProjectionMatrix", "vPos"]);
        assert_eq!(shader.declarations()[0].line, 3);
    }

    #[test]
    fn garbage_source_reports_line_and_token() {
        let err = compile(ShaderStage::Fragment, "\nthis is not a shader").unwrap_err();
        assert_eq!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                log: "ERROR: 0:2: 'this' : syntax error".to_string(),
            }
        );
    }

    #[test]
    fn attribute_in_fragment_stage_is_rejected() {
        let err = compile(ShaderStage::Fragment, "attribute vec3 normal;").unwrap_err();
        assert!(err.to_string().contains("supported in vertex shaders only"));
    }

    #[test]
    fn unterminated_body_is_rejected() {
        let err = compile(ShaderStage::Vertex, "void main() {").unwrap_err();
        assert!(err.to_string().contains("unexpected end of file"));
    }

    #[test]
    fn link_assigns_locations() {
        let v = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let f = compile(ShaderStage::Fragment, FRAGMENT).unwrap();
        let program = link(&v, &f, Box::new(Passthrough)).unwrap();
        assert_eq!(program.attribute_index("vertex"), Some(0));
        assert_eq!(program.uniform_index("color"), Some(1));
        assert_eq!(program.uniform_index("missing"), None);
        assert_eq!(program.kernel_uniform_slots(), &[1]);
    }

    #[test]
    fn link_rejects_missing_main() {
        let v = compile(ShaderStage::Vertex, "attribute vec3 vertex;").unwrap();
        let f = compile(ShaderStage::Fragment, FRAGMENT).unwrap();
        let err = link(&v, &f, Box::new(Passthrough)).unwrap_err();
        assert_eq!(err, ShaderError::Link("Missing main() in vertex shader".to_string()));
    }

    #[test]
    fn link_rejects_undeclared_kernel_input() {
        let v = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let f = compile(ShaderStage::Fragment, "varying vec3 vPos; void main() {}").unwrap();
        let err = link(&v, &f, Box::new(Passthrough)).unwrap_err();
        assert!(err.to_string().contains("Kernel input 'color' (vec4)"));
    }
}
