use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DataEnum, DeriveInput, Error, Expr, ExprLit, Fields, Lit, Meta, parse_macro_input};

/// 拼接doc注释，每行去掉注释符号后的第一个空格。
fn extract_doc(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_owned).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 为只包含单元变体的枚举生成命令帮助：
/// - `help(&self)`：变体的doc注释
/// - `all_help()`：全部`(命令名, 帮助)`，命令名为小写的变体名
/// - `all()`：全部变体，按声明顺序
/// - `from_cmd(name)`：按命令名查找变体
#[proc_macro_derive(CmdHelp)]
pub fn cmd_help_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let enum_name = &input.ident;

    let Data::Enum(DataEnum { variants, .. }) = &input.data else {
        return Error::new_spanned(enum_name, "CmdHelp can only be derived on enums").to_compile_error().into();
    };
    if let Some(v) = variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
        return Error::new_spanned(&v.ident, "CmdHelp only supports unit variants").to_compile_error().into();
    }

    let idents = variants.iter().map(|v| &v.ident).collect::<Vec<_>>();
    let names = idents.iter().map(|ident| ident.to_string().to_lowercase()).collect::<Vec<_>>();
    let docs = variants.iter().map(|v| extract_doc(&v.attrs)).collect::<Vec<_>>();

    let expanded = quote! {
        impl #enum_name {
            /// 获取帮助信息。
            pub fn help(&self) -> &'static str {
                match self {
                    #(Self::#idents => #docs,)*
                }
            }

            /// 获取全部帮助信息：[(name, help), ...]
            pub fn all_help() -> &'static [(&'static str, &'static str)] {
                &[#((#names, #docs)),*]
            }

            /// 全部命令，按声明顺序。
            pub fn all() -> &'static [#enum_name] {
                &[#(Self::#idents),*]
            }

            /// 按命令名查找。
            pub fn from_cmd(name: &str) -> Option<#enum_name> {
                match name {
                    #(#names => Some(Self::#idents),)*
                    _ => None,
                }
            }

            /// 命令名。
            pub fn cmd(&self) -> &'static str {
                match self {
                    #(Self::#idents => #names,)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}
